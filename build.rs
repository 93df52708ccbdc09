// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("forensicstore")
        .version(env!("CARGO_PKG_VERSION"))
        .author("forensicstore contributors")
        .about("Handle forensicstore containers")
        .subcommand_required(false)
        .subcommand(
            Command::new("item")
                .about("Operate on items within a forensicstore container")
                .subcommand(
                    Command::new("create")
                        .about("Create an empty forensicstore container")
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("get")
                        .about("Print a single item by id")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("select")
                        .about("Print every item of a given type")
                        .arg(Arg::new("type").required(true))
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("all")
                        .about("Print every item in the container")
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("insert")
                        .about("Insert a new item from a JSON document")
                        .arg(Arg::new("json").required(true))
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("update")
                        .about("Merge a partial JSON document into an existing item")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("json").required(true))
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("import")
                        .about("Import another container's items and payloads")
                        .arg(Arg::new("url").required(true))
                        .arg(Arg::new("store").required(true)),
                )
                .subcommand(
                    Command::new("export")
                        .about("Export the container as a JSON interchange envelope")
                        .arg(Arg::new("store").required(true))
                        .arg(Arg::new("url").required(true)),
                )
                .subcommand(
                    Command::new("validate")
                        .about("Validate a container's records and payload files")
                        .arg(Arg::new("store").required(true))
                        .arg(
                            Arg::new("no-fail")
                                .long("no-fail")
                                .action(clap::ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("forensicstore.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
