// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Funding accounts")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("cash")
                        .help("cash|debit|credit|ewallet|investment|renovation|other"),
                )
                .arg(Arg::new("balance").long("balance").default_value("0"))
                .arg(Arg::new("color").long("color").default_value(""))
                .arg(Arg::new("icon").long("icon").default_value("")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
        .subcommand(
            Command::new("set-balance")
                .about("Reconcile an account, recording the difference as an adjustment")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("balance").long("balance").required(true)),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Expense and income categories")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("expense")
                        .help("expense|income"),
                )
                .arg(Arg::new("symbol").long("symbol").default_value(""))
                .arg(Arg::new("color").long("color").default_value("")),
        )
        .subcommand(json_flags(
            Command::new("list").arg(Arg::new("type").long("type").help("expense|income")),
        ))
        .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Transactions")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("title").long("title"))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("YYYY-MM-DD or YYYY-MM-DD HH:MM (default: now)"),
                ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .arg(Arg::new("from").long("from").help("YYYY-MM-DD, inclusive"))
                .arg(Arg::new("to").long("to").help("YYYY-MM-DD, inclusive"))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("account").long("account"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(
            Command::new("rm").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Aggregated spending")
        .subcommand(json_flags(
            Command::new("summary").arg(
                Arg::new("months")
                    .long("months")
                    .value_parser(value_parser!(usize))
                    .default_value("12"),
            ),
        ))
        .subcommand(json_flags(
            Command::new("by-category")
                .arg(Arg::new("month").long("month").required(true).help("YYYY-MM"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("expense")
                        .help("expense|income"),
                ),
        ))
}

fn llm_cmd() -> Command {
    Command::new("llm")
        .about("LLM endpoint configurations")
        .subcommand(Command::new("providers").about("Known provider presets"))
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").default_value(""))
                .arg(
                    Arg::new("provider")
                        .long("provider")
                        .default_value("openai")
                        .help("Preset slug, see `llm providers`"),
                )
                .arg(Arg::new("base_url").long("base-url"))
                .arg(Arg::new("model").long("model"))
                .arg(Arg::new("api_key").long("api-key")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("use").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("set-key")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("api_key").long("api-key").required(true)),
        )
        .subcommand(
            Command::new("rm").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("test")
                .about("Connectivity check against a configuration (default: active)")
                .arg(Arg::new("id").long("id").value_parser(value_parser!(i64))),
        )
}

pub fn build_cli() -> Command {
    Command::new("chatledger")
        .about("Expense tracking with natural-language recording and questions")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database and seed defaults"))
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(report_cmd())
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("transactions")
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(llm_cmd())
        .subcommand(
            Command::new("ask")
                .about("Ask a question about your ledger")
                .arg(Arg::new("question").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("record")
                .about("Record transactions described in natural language")
                .arg(Arg::new("text").required(true).num_args(1..))
                .arg(
                    Arg::new("voice")
                        .long("voice")
                        .action(ArgAction::SetTrue)
                        .help("Text is a speech transcript"),
                )
                .arg(
                    Arg::new("single")
                        .long("single")
                        .action(ArgAction::SetTrue)
                        .help("Do not split into multiple transactions"),
                ),
        )
}
