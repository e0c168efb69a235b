// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::assistant::{Assistant, InputSource, SegmentOutcome};
use crate::commands::llm::active_client;
use crate::ledger::Inserted;
use crate::utils::fmt_money;
use anyhow::{Result, anyhow};
use chrono::Local;
use rusqlite::Connection;

fn joined(m: &clap::ArgMatches, id: &str) -> Result<String> {
    let words: Vec<&str> = m
        .get_many::<String>(id)
        .ok_or_else(|| anyhow!("Missing required argument '{}'", id))?
        .map(|s| s.as_str())
        .collect();
    Ok(words.join(" "))
}

pub fn describe_inserted(ins: &Inserted) -> String {
    let t = &ins.transaction;
    let mut line = format!(
        "Recorded {} {} · {} · {}",
        ins.kind,
        fmt_money(&t.amount),
        t.category_name,
        t.title
    );
    if let Some(acct) = &t.account_name {
        line.push_str(&format!(" · {}", acct));
        if let Some(bal) = ins.account_balance {
            line.push_str(&format!(" (balance {})", fmt_money(&bal)));
        }
    }
    line.push_str(&format!(" · {}", t.date.format("%Y-%m-%d %H:%M")));
    line
}

pub fn handle_ask(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let question = joined(m, "question")?;
    let client = active_client(conn).map_err(|e| anyhow!(e.user_message()))?;
    let assistant = Assistant::new(&client);
    let answer = assistant
        .ask(conn, &question, Local::now().naive_local())
        .map_err(|e| anyhow!(e.user_message()))?;
    println!("{}", answer.text.trim());
    Ok(())
}

pub fn handle_record(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let text = joined(m, "text")?;
    let source = if m.get_flag("voice") {
        InputSource::Voice
    } else {
        InputSource::Typed
    };
    let now = Local::now().naive_local();
    let client = active_client(conn).map_err(|e| anyhow!(e.user_message()))?;
    let assistant = Assistant::new(&client);

    if m.get_flag("single") {
        let ins = assistant
            .record(conn, &text, now, source)
            .map_err(|e| anyhow!(e.user_message()))?;
        println!("{}", describe_inserted(&ins));
        return Ok(());
    }

    let outcomes = assistant.record_batch(conn, &text, now, source);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    for SegmentOutcome { segment, result } in &outcomes {
        match result {
            Ok(ins) => println!("{}", describe_inserted(ins)),
            Err(e) => println!("Skipped \"{}\": {}", segment, e.user_message()),
        }
    }
    if failed > 0 && failed == outcomes.len() {
        return Err(anyhow!("Nothing was recorded"));
    }
    Ok(())
}
