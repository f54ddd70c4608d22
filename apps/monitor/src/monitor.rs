//! The poll / detect / notify loop.

use crate::clock::Clock;
use spread_alerts::{escape_html, BlacklistStore, Command, CommandPoller, Notifier};
use spread_core::{Exchange, Symbol};
use spread_engine::{CooldownKey, CooldownTracker, SpreadDetector};
use spread_feeds::FeedSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Loop settings that are not owned by a component.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Symbols to scan; empty scans everything listed twice or more.
    pub symbols: Vec<Symbol>,
    pub scan_interval: Duration,
    /// Prune cooldowns and log stats every this many cycles.
    pub stats_every_cycles: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            scan_interval: Duration::from_secs(30),
            stats_every_cycles: 30,
        }
    }
}

/// Outcome of one [`SpreadMonitor::run_cycle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub symbols_scanned: usize,
    pub opportunities: usize,
    pub alerts_sent: usize,
    pub suppressed_by_cooldown: usize,
    pub skipped_blacklisted: usize,
    pub send_failures: usize,
    pub failed_exchanges: Vec<Exchange>,
}

/// Running totals since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonitorStats {
    pub cycles: u64,
    pub opportunities: u64,
    pub alerts_sent: u64,
    pub suppressed_by_cooldown: u64,
    pub send_failures: u64,
    pub fetch_failures: u64,
    pub commands_handled: u64,
}

impl MonitorStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.opportunities += report.opportunities as u64;
        self.alerts_sent += report.alerts_sent as u64;
        self.suppressed_by_cooldown += report.suppressed_by_cooldown as u64;
        self.send_failures += report.send_failures as u64;
        self.fetch_failures += report.failed_exchanges.len() as u64;
    }
}

/// Owns every component of the monitor; nothing is shared globally.
pub struct SpreadMonitor {
    feeds: FeedSet,
    detector: SpreadDetector,
    cooldown: CooldownTracker,
    blacklist: BlacklistStore,
    notifier: Notifier,
    commands: CommandPoller,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    stats: MonitorStats,
}

impl SpreadMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feeds: FeedSet,
        detector: SpreadDetector,
        cooldown: CooldownTracker,
        blacklist: BlacklistStore,
        notifier: Notifier,
        commands: CommandPoller,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            feeds,
            detector,
            cooldown,
            blacklist,
            notifier,
            commands,
            clock,
            settings,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    pub fn blacklist(&self) -> &BlacklistStore {
        &self.blacklist
    }

    /// Fetch, detect and notify once.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let quotes = self.feeds.fetch_cycle(&self.settings.symbols).await;
        let mut report = CycleReport {
            failed_exchanges: quotes.failed.iter().map(|(e, _)| *e).collect(),
            ..Default::default()
        };

        for (symbol, symbol_quotes) in &quotes.by_symbol {
            if self.blacklist.contains(symbol) {
                report.skipped_blacklisted += 1;
                continue;
            }
            report.symbols_scanned += 1;

            for opp in self.detector.detect_all(symbol_quotes) {
                report.opportunities += 1;
                let key = CooldownKey::from(&opp);
                let now = self.clock.now();

                if !self.cooldown.should_alert(&key, now) {
                    debug!(symbol = %opp.symbol, pair = %key.pair, "In cooldown, not sending");
                    report.suppressed_by_cooldown += 1;
                    continue;
                }

                // the notifier logs send failures itself
                match self.notifier.send_opportunity(&opp).await {
                    Ok(()) => {
                        self.cooldown.record_alert(key, now);
                        report.alerts_sent += 1;
                    }
                    Err(_) => report.send_failures += 1,
                }
            }
        }

        self.stats.record(&report);
        info!(
            cycle = self.stats.cycles,
            symbols = report.symbols_scanned,
            opportunities = report.opportunities,
            sent = report.alerts_sent,
            cooldown = report.suppressed_by_cooldown,
            blacklisted = report.skipped_blacklisted,
            failed_exchanges = report.failed_exchanges.len(),
            "Cycle complete"
        );
        report
    }

    /// Apply pending chat commands and reply to each. Returns how many were
    /// handled.
    pub async fn poll_commands(&mut self) -> usize {
        let commands = match self.commands.poll().await {
            Ok(commands) => commands,
            Err(e) => {
                warn!("Failed to poll commands: {}", e);
                return 0;
            }
        };

        let handled = commands.len();
        for command in commands {
            let reply = self.apply_command(command);
            if let Err(e) = self.notifier.send_text(&reply).await {
                warn!("Failed to send command reply: {}", e);
            }
        }
        self.stats.commands_handled += handled as u64;
        handled
    }

    /// Execute `command` and return the reply text.
    pub fn apply_command(&mut self, command: Command) -> String {
        match command {
            Command::Blacklist(arg) => {
                let arg = arg.trim();
                if arg.is_empty() {
                    return self.blacklist_summary();
                }
                match Symbol::parse(arg) {
                    Some(symbol) => {
                        if self.blacklist.add(symbol.clone()) {
                            format!("🚫 {} added to blacklist", symbol)
                        } else {
                            format!("{} is already blacklisted", symbol)
                        }
                    }
                    None => format!("Unrecognized symbol: {}", escape_html(arg)),
                }
            }
            Command::Help => Command::help_text(),
        }
    }

    fn blacklist_summary(&self) -> String {
        if self.blacklist.is_empty() {
            return "Blacklist is empty.".to_string();
        }
        let symbols: Vec<String> = self.blacklist.list().iter().map(|s| s.to_string()).collect();
        format!("<b>Blacklist ({}):</b>\n{}", symbols.len(), symbols.join(", "))
    }

    /// Periodic housekeeping: prune expired cooldowns and log totals. Runs
    /// every `stats_every_cycles` cycles; returns true when it ran.
    pub fn maintain(&mut self) -> bool {
        let every = self.settings.stats_every_cycles.max(1);
        if self.stats.cycles == 0 || self.stats.cycles % every != 0 {
            return false;
        }

        let pruned = self.cooldown.prune(self.clock.now());
        let stats = self.stats;
        info!(
            cycles = stats.cycles,
            sent = stats.alerts_sent,
            opportunities = stats.opportunities,
            cooldown = stats.suppressed_by_cooldown,
            send_failures = stats.send_failures,
            fetch_failures = stats.fetch_failures,
            commands = stats.commands_handled,
            pruned,
            tracked = self.cooldown.len(),
            blacklisted = self.blacklist.len(),
            "Stats"
        );
        true
    }

    /// Send the startup notice, then cycle until the future is dropped.
    pub async fn run(&mut self) {
        let exchanges = self.feeds.exchanges();
        let min_spread = self.detector.config().min_spread_percent;
        info!(
            exchanges = exchanges.len(),
            min_spread = %min_spread,
            interval_secs = self.settings.scan_interval.as_secs(),
            "Spread monitor started"
        );
        if let Err(e) = self.notifier.send_startup(min_spread, &exchanges).await {
            warn!("Failed to send startup notice: {}", e);
        }

        loop {
            let started = Instant::now();
            self.run_cycle().await;
            self.poll_commands().await;
            self.maintain();
            tokio::time::sleep(next_delay(self.settings.scan_interval, started.elapsed())).await;
        }
    }
}

/// Sleep until the next cycle: the rest of the interval, at least one second.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed).max(Duration::from_secs(1))
}
