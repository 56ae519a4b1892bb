//! Canned run used by the `demo` command.

use crate::history::HistoryEntry;
use crate::model::{ModelId, RunResult};

pub const DEMO_URL1: &str = "https://example.com/blog/sqlite-in-production";
pub const DEMO_URL2: &str = "https://news.ycombinator.com/item?id=40000001";
pub const DEMO_HN_TITLE: &str = "Running SQLite in Production";

const DEMO_SUMMARY1: &str = "\
• The overall main point is that a single SQLite file can serve many production web workloads once write patterns are understood

• WAL mode lets readers proceed while one writer commits
• Backups are handled by streaming the write-ahead log to object storage
• The author moved a service off a managed database and cut hosting costs
• Write-heavy multi-tenant workloads are called out as a poor fit";

const DEMO_SUMMARY2: &str = "\
• The overall main point is that commenters agree SQLite is underrated but disagree on where its limits are

• According to user kv_store: busy_timeout plus WAL removed every lock error they had seen
• According to user ops_anna: restoring from streamed WAL backups needs regular drills
• According to user pgfan: Postgres still wins once several services share one database
• According to user edge_dev: read replicas at the edge make SQLite attractive for global apps";

const DEMO_SYNTHESIS: &str = "\
# SQLite in Production: Simple Until It Isn't

## TOPIC FOLLOWS: Concurrency and Locking

• According to the Article: WAL mode lets readers proceed while a single writer commits
• According to Hacker News User kv_store: Setting busy_timeout alongside WAL eliminated lock errors in practice
• According to the Article: Write-heavy multi-tenant workloads remain a poor fit

## TOPIC FOLLOWS: Backups and Recovery

• According to the Article: Streaming the write-ahead log to object storage provides continuous backups
• According to Hacker News User ops_anna: Restores from streamed backups must be rehearsed regularly

## TOPIC FOLLOWS: Choosing Between SQLite and Postgres

• According to the Article: Moving off a managed database cut hosting costs
• According to Hacker News User pgfan: Postgres remains the better choice when several services share a database
• According to Hacker News User edge_dev: Edge read replicas make SQLite compelling for global applications

## PROVENANCE
- Article: \"Running SQLite in Production\", example.com blog
- Discussion: Hacker News thread on the article

- https://example.com/blog/sqlite-in-production
- https://news.ycombinator.com/item?id=40000001";

pub fn demo_result() -> RunResult {
    RunResult {
        summary1: Some(DEMO_SUMMARY1.to_string()),
        summary2: Some(DEMO_SUMMARY2.to_string()),
        synthesis: Some(DEMO_SYNTHESIS.to_string()),
    }
}

/// Demo data shaped as a history entry.
pub fn demo_entry() -> HistoryEntry {
    let mut entry = HistoryEntry::new(ModelId::default(), demo_result());
    entry.url1 = Some(DEMO_URL1.to_string());
    entry.url2 = Some(DEMO_URL2.to_string());
    entry.hn_thread_url = Some(DEMO_URL2.to_string());
    entry.hn_title = Some(DEMO_HN_TITLE.to_string());
    entry
}
