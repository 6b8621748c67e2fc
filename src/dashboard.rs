/// Terminal dashboard
///
/// Renders the aggregate view model as comfy-table panels. The redraw loop
/// follows the store's watch channel, so frames are produced only on change and
/// coalesced to `min_redraw_interval_ms`.
use crate::aggregator::types::{
    AggregateViewModel, MetricKey, MetricSnapshot, MetricStatus, MetricValue, QueryOutcome,
    QuerySlot, QueryValue, TransactionDetails, WalletInfo, WalletTransaction,
};
use crate::config::DashboardConfig;
use crate::constants::{lamports_f64_to_sol, lamports_to_sol, SOL_DECIMALS};
use crate::logger::{self, LogTag};
use chrono::{DateTime, TimeZone, Utc};
use comfy_table::{modifiers, presets, Attribute, Cell, Color, ContentArrangement, Table};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

// =============================================================================
// FORMATTING HELPERS
// =============================================================================

pub fn format_usd(value: f64) -> String {
    format!("${:.2}", value)
}

pub fn format_sol(lamports: u64) -> String {
    format!("{:.*} SOL", SOL_DECIMALS, lamports_to_sol(lamports))
}

pub fn format_sol_f64(lamports: f64) -> String {
    format!("{:.*} SOL", SOL_DECIMALS, lamports_f64_to_sol(lamports))
}

pub fn format_tps(value: f64) -> String {
    format!("{:.2}", value)
}

/// Thousands separators for large counters
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_age(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "never".to_string();
    };
    let secs = (now - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{}s ago", secs),
        60..=3599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3600),
    }
}

pub fn format_block_time(block_time: Option<i64>) -> String {
    block_time
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn metric_label(key: MetricKey) -> &'static str {
    match key {
        MetricKey::SolPrice => "SOL Price",
        MetricKey::NetworkStats => "Network",
        MetricKey::TransactionMetrics => "Transactions",
        MetricKey::EpochInfo => "Epoch",
        MetricKey::GasFees => "Gas Fees",
        MetricKey::ClusterHealth => "Cluster Health",
        MetricKey::FinalityTime => "Finality",
        MetricKey::LatestBlock => "Latest Block",
        MetricKey::Validators => "Validators",
    }
}

pub fn format_metric_value(value: &MetricValue) -> String {
    match value {
        MetricValue::SolPrice { usd } => format_usd(*usd),
        MetricValue::NetworkStats {
            block_height,
            active_nodes,
        } => format!(
            "height {} | {} RPC nodes",
            format_count(*block_height),
            active_nodes
        ),
        MetricValue::TransactionMetrics {
            txn_count,
            txn_per_sec,
        } => format!("{} total | {} TPS", format_count(*txn_count), format_tps(*txn_per_sec)),
        MetricValue::EpochInfo {
            epoch,
            slot_index,
            slots_in_epoch,
            progress_pct,
        } => format!(
            "epoch {} | {}/{} slots ({:.2}%)",
            epoch, slot_index, slots_in_epoch, progress_pct
        ),
        MetricValue::GasFees {
            average_fee,
            total_fee,
            transaction_count,
        } => format!(
            "avg {} | total {} over {} txs",
            format_sol_f64(*average_fee),
            format_sol(*total_fee),
            transaction_count
        ),
        MetricValue::ClusterHealth {
            ping_ms,
            total_nodes,
            active_nodes,
        } => format!(
            "ping {}ms | {}/{} nodes with RPC",
            ping_ms, active_nodes, total_nodes
        ),
        MetricValue::FinalityTime { seconds } => format!("{}s since last finalized block", seconds),
        MetricValue::LatestBlock {
            block_height,
            slot,
            blockhash,
            transaction_count,
            block_time,
        } => format!(
            "slot {} | height {} | {} txs | {} | {}",
            slot,
            block_height
                .map(format_count)
                .unwrap_or_else(|| "-".to_string()),
            transaction_count,
            short_id(blockhash),
            format_block_time(*block_time)
        ),
        MetricValue::Validators {
            current,
            delinquent,
            average_commission,
        } => format!(
            "{} current | {} delinquent | avg commission {:.2}%",
            current, delinquent, average_commission
        ),
    }
}

/// First and last characters of a long base58 id
pub fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 16 {
        return id.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}…{}", head, tail)
}

fn status_cell(status: MetricStatus) -> Cell {
    let color = match status {
        MetricStatus::Pending => Color::Grey,
        MetricStatus::Fresh => Color::Green,
        MetricStatus::Stale => Color::Yellow,
        MetricStatus::Failed => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

// =============================================================================
// PANELS
// =============================================================================

fn metric_row_text(snapshot: &MetricSnapshot) -> String {
    match (&snapshot.value, snapshot.status) {
        (Some(value), _) => format_metric_value(value),
        (None, MetricStatus::Pending) => "Loading...".to_string(),
        (None, _) => snapshot
            .last_error
            .clone()
            .unwrap_or_else(|| "unavailable".to_string()),
    }
}

pub fn metrics_table(vm: &AggregateViewModel, now: DateTime<Utc>) -> Table {
    let mut table = new_table();
    table.set_header(header(&["Metric", "Value", "Status", "Updated"]));

    for key in MetricKey::ALL {
        let snapshot = vm.metric(key);
        table.add_row(vec![
            Cell::new(metric_label(key)),
            Cell::new(metric_row_text(snapshot)),
            status_cell(snapshot.status),
            Cell::new(format_age(snapshot.last_success, now)),
        ]);
    }

    table
}

pub fn render_transaction(details: &TransactionDetails) -> String {
    let mut table = new_table();
    table.set_header(header(&["Field", "Value"]));
    table.add_row(vec![Cell::new("Signature"), Cell::new(&details.signature)]);
    table.add_row(vec![Cell::new("Slot"), Cell::new(details.slot)]);
    table.add_row(vec![
        Cell::new("Block time"),
        Cell::new(format_block_time(details.block_time)),
    ]);
    table.add_row(vec![Cell::new("Fee"), Cell::new(format_sol(details.fee_lamports))]);
    let result = if details.succeeded {
        Cell::new("Success").fg(Color::Green)
    } else {
        Cell::new("Failed").fg(Color::Red)
    };
    table.add_row(vec![Cell::new("Result"), result]);
    table.to_string()
}

pub fn render_wallet(info: &WalletInfo) -> String {
    let mut out = format!(
        "Wallet {}\nSOL balance: {:.*} SOL\n",
        info.address, SOL_DECIMALS, info.sol_balance
    );

    if info.tokens.is_empty() {
        out.push_str("No SPL token accounts\n");
        return out;
    }

    let mut table = new_table();
    table.set_header(header(&["Mint", "Balance", "Decimals"]));
    for token in &info.tokens {
        table.add_row(vec![
            Cell::new(&token.mint),
            Cell::new(format!("{:.*}", token.decimals as usize, token.balance)),
            Cell::new(token.decimals),
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

pub fn render_history(history: &[WalletTransaction]) -> String {
    if history.is_empty() {
        return "No recent transactions\n".to_string();
    }

    let mut table = new_table();
    table.set_header(header(&["Signature", "Slot", "Time", "Fee", "Status", "Instructions"]));
    for tx in history {
        let status = if tx.status == "Success" {
            Cell::new(&tx.status).fg(Color::Green)
        } else {
            Cell::new(&tx.status).fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(short_id(&tx.signature)),
            Cell::new(tx.slot),
            Cell::new(format_block_time(tx.block_time)),
            Cell::new(format_sol(tx.fee)),
            status,
            Cell::new(tx.instructions.len()),
        ]);
    }
    let mut out = table.to_string();
    out.push('\n');
    out
}

pub fn render_query_value(value: &QueryValue) -> String {
    match value {
        QueryValue::Transaction(details) => render_transaction(details),
        QueryValue::Wallet(info) => render_wallet(info),
        QueryValue::WalletHistory(history) => render_history(history),
    }
}

pub fn render_query_outcome(slot: QuerySlot, outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Found { value } => render_query_value(value),
        QueryOutcome::NotFound { input } => match slot {
            QuerySlot::Transaction => format!("Transaction not found: {}\n", input),
            QuerySlot::Wallet | QuerySlot::WalletHistory => {
                format!("No data for wallet {}\n", input)
            }
        },
        QueryOutcome::Failed { message, .. } => format!("{}\n", message),
    }
}

/// Whole dashboard frame as text
pub fn render_frame(vm: &AggregateViewModel, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let slot_line = match &vm.slot {
        Some(update) => format!(
            "Slot {} (parent {}, root {})",
            update.slot, update.parent, update.root
        ),
        None => "Slot subscription: waiting".to_string(),
    };
    out.push_str(&format!(
        "solscope | {} | {}\n",
        now.format("%H:%M:%S UTC"),
        slot_line
    ));
    out.push_str(&metrics_table(vm, now).to_string());
    out.push('\n');

    if let Some(outcome) = vm.query(QuerySlot::Wallet) {
        out.push('\n');
        out.push_str(&render_query_outcome(QuerySlot::Wallet, outcome));
    }

    out
}

// =============================================================================
// REDRAW LOOP
// =============================================================================

pub struct Dashboard {
    config: DashboardConfig,
    interactive: bool,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            interactive: io::stdout().is_terminal(),
            config,
        }
    }

    fn draw(&self, vm: &AggregateViewModel) -> io::Result<()> {
        let frame = render_frame(vm, Utc::now());
        let mut stdout = io::stdout().lock();

        if self.config.clear_screen && self.interactive {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()
    }

    /// Redraw on every view model change until `shutdown` fires
    pub async fn run(
        &self,
        mut updates: watch::Receiver<AggregateViewModel>,
        shutdown: Arc<Notify>,
    ) -> io::Result<()> {
        let throttle = Duration::from_millis(self.config.min_redraw_interval_ms);
        logger::debug(
            LogTag::Dashboard,
            &format!(
                "Dashboard running (interactive={}, throttle={}ms)",
                self.interactive,
                throttle.as_millis()
            ),
        );

        loop {
            let vm = updates.borrow_and_update().clone();
            self.draw(&vm)?;

            tokio::select! {
                _ = shutdown.notified() => break,
                _ = tokio::time::sleep(throttle) => {}
            }

            tokio::select! {
                _ = shutdown.notified() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        logger::debug(LogTag::Dashboard, "Dashboard stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::types::TokenBalance;

    #[test]
    fn test_number_formats() {
        assert_eq!(format_usd(142.371), "$142.37");
        assert_eq!(format_tps(2500.0), "2500.00");
        assert_eq!(format_sol(5000), "0.000005000 SOL");
        assert_eq!(format_sol_f64(7500.0), "0.000007500 SOL");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn test_age() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let at = |secs: i64| Some(now - chrono::Duration::seconds(secs));
        assert_eq!(format_age(None, now), "never");
        assert_eq!(format_age(at(5), now), "5s ago");
        assert_eq!(format_age(at(125), now), "2m ago");
        assert_eq!(format_age(at(7300), now), "2h ago");
    }

    #[test]
    fn test_block_time() {
        assert_eq!(format_block_time(Some(0)), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_block_time(None), "unknown");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abc"), "abc");
        let id = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";
        assert_eq!(short_id(id), "5VERv8…SZkQUW");
    }

    #[test]
    fn test_short_id_multibyte() {
        let id = "ééééééééééééééééééééxyz";
        assert_eq!(short_id(id), "éééééé…éééxyz");
        assert_eq!(short_id("日本語"), "日本語");
    }

    #[test]
    fn test_pending_metric_shows_loading() {
        let vm = AggregateViewModel::new();
        let frame = render_frame(&vm, Utc::now());
        assert!(frame.contains("Loading..."));
        assert!(frame.contains("SOL Price"));
        assert!(frame.contains("Slot subscription: waiting"));
    }

    #[test]
    fn test_stale_metric_keeps_value_on_screen() {
        let mut vm = AggregateViewModel::new();
        let fresh = MetricSnapshot::fresh(MetricValue::SolPrice { usd: 99.5 }, Utc::now());
        vm.metrics
            .insert(MetricKey::SolPrice, fresh.after_failure("timeout".to_string()));

        let frame = render_frame(&vm, Utc::now());
        assert!(frame.contains("$99.50"));
        assert!(frame.contains("stale"));
    }

    #[test]
    fn test_wallet_rendering() {
        let info = WalletInfo {
            address: "Wallet111".to_string(),
            sol_balance: 1.5,
            tokens: vec![TokenBalance {
                mint: "Mint111".to_string(),
                balance: 2.5,
                decimals: 2,
            }],
        };
        let text = render_wallet(&info);
        assert!(text.contains("1.500000000 SOL"));
        assert!(text.contains("Mint111"));
        assert!(text.contains("2.50"));
    }

    #[test]
    fn test_failed_query_shows_user_message() {
        let outcome = QueryOutcome::Failed {
            message: "Failed to fetch transaction".to_string(),
            reason: "rpc unavailable".to_string(),
        };
        assert_eq!(
            render_query_outcome(QuerySlot::Transaction, &outcome),
            "Failed to fetch transaction\n"
        );
    }
}
