// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as a JSON array"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("moneybook")
        .about("Personal finance ledger: asset accounts, savings goals, recurring schedules")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users and the active session")
                .subcommand(
                    Command::new("add")
                        .about("Add a user")
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list").about("List users"))
                .subcommand(
                    Command::new("use")
                        .about("Select the acting user")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage income/expense categories")
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("kind").long("kind").required(true)),
                )
                .subcommand(Command::new("list").about("List categories"))
                .subcommand(Command::new("rm").about("Remove a category").arg(id_arg())),
        )
        .subcommand(
            Command::new("asset")
                .about("Manage asset accounts")
                .subcommand(
                    Command::new("add")
                        .about("Add an asset")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("kind").long("kind").required(true)),
                )
                .subcommand(json_flags(Command::new("list").about("List assets")))
                .subcommand(
                    Command::new("toggle")
                        .about("Flip an asset's active flag")
                        .arg(id_arg()),
                )
                .subcommand(Command::new("rm").about("Remove an asset").arg(id_arg())),
        )
        .subcommand(
            Command::new("atx")
                .about("Asset transactions (balance-affecting)")
                .subcommand(
                    Command::new("add")
                        .about("Record an asset transaction")
                        .arg(
                            Arg::new("asset")
                                .long("asset")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("kind").long("kind").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("memo").long("memo"))
                        .arg(Arg::new("to").long("to").value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Edit an asset transaction")
                        .arg(id_arg())
                        .arg(Arg::new("asset").long("asset").value_parser(value_parser!(i64)))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("memo").long("memo"))
                        .arg(Arg::new("to").long("to").value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete an asset transaction")
                        .arg(id_arg()),
                )
                .subcommand(
                    json_flags(
                        Command::new("list")
                            .about("List asset transactions dated up to today")
                            .arg(
                                Arg::new("asset")
                                    .long("asset")
                                    .value_parser(value_parser!(i64)),
                            ),
                    ),
                ),
        )
        .subcommand(
            Command::new("record")
                .about("Income/expense/saving records")
                .subcommand(
                    Command::new("add")
                        .about("Record an entry")
                        .arg(Arg::new("kind").long("kind").required(true))
                        .arg(Arg::new("title").long("title").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("memo").long("memo")),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Edit an entry")
                        .arg(id_arg())
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("title").long("title"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("date").long("date"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("memo").long("memo")),
                )
                .subcommand(Command::new("rm").about("Delete an entry").arg(id_arg()))
                .subcommand(
                    json_flags(
                        Command::new("list")
                            .about("List entries dated up to today")
                            .arg(Arg::new("month").long("month"))
                            .arg(Arg::new("kind").long("kind")),
                    ),
                ),
        )
        .subcommand(fixed_def_command(
            "fixed-expense",
            "Recurring expense definitions",
            false,
        ))
        .subcommand(fixed_def_command(
            "fixed-saving",
            "Recurring saving definitions",
            true,
        ))
        .subcommand(
            Command::new("goal")
                .about("Savings goal")
                .subcommand(
                    Command::new("set")
                        .about("Set the target and initial amounts")
                        .arg(Arg::new("target").long("target").required(true))
                        .arg(Arg::new("initial").long("initial")),
                )
                .subcommand(Command::new("status").about("Show net worth against the goal")),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(export_sub("transactions"))
                .subcommand(export_sub("asset-transactions")),
        )
}

fn fixed_def_command(name: &'static str, about: &'static str, with_asset: bool) -> Command {
    let mut add = Command::new("add")
        .about("Add a definition and generate its rows")
        .arg(Arg::new("title").long("title").required(true))
        .arg(Arg::new("amount").long("amount").required(true))
        .arg(
            Arg::new("day")
                .long("day")
                .required(true)
                .value_parser(value_parser!(u32)),
        )
        .arg(Arg::new("start").long("start").required(true))
        .arg(Arg::new("end").long("end").required(true));
    let mut edit = Command::new("edit")
        .about("Edit a definition and regenerate future rows")
        .arg(id_arg())
        .arg(Arg::new("title").long("title"))
        .arg(Arg::new("amount").long("amount"))
        .arg(Arg::new("day").long("day").value_parser(value_parser!(u32)))
        .arg(Arg::new("start").long("start"))
        .arg(Arg::new("end").long("end"));
    if with_asset {
        add = add.arg(
            Arg::new("asset")
                .long("asset")
                .required(true)
                .value_parser(value_parser!(i64)),
        );
        edit = edit.arg(Arg::new("asset").long("asset").value_parser(value_parser!(i64)));
    } else {
        add = add.arg(
            Arg::new("category")
                .long("category")
                .value_parser(value_parser!(i64)),
        );
        edit = edit.arg(
            Arg::new("category")
                .long("category")
                .value_parser(value_parser!(i64)),
        );
    }
    Command::new(name)
        .about(about)
        .subcommand(add)
        .subcommand(edit)
        .subcommand(
            Command::new("rm")
                .about("Delete a definition and its future rows")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("toggle")
                .about("Activate or deactivate a definition")
                .arg(id_arg()),
        )
        .subcommand(json_flags(Command::new("list").about("List definitions")))
}

fn export_sub(name: &'static str) -> Command {
    Command::new(name)
        .arg(Arg::new("format").long("format").required(true))
        .arg(Arg::new("out").long("out").required(true))
}
