//! Paper Broker
//!
//! Stands in for the host's execution venue during replays. Fills every
//! target-percent order immediately at the session's last close, tracks cash
//! and fractional share holdings, and reports leverage as gross exposure over
//! net liquidation value.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::domain::{DailyFrame, Instrument};
use crate::ports::{ExecutionError, ExecutionPort};

/// Running totals for the paper account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperStats {
    /// Orders that changed a holding
    pub orders_filled: u32,
    /// Absolute notional traded
    pub turnover: f64,
    /// Highest net liquidation value marked at a session open
    pub peak_value: f64,
    /// Largest peak-to-mark decline, in percent
    pub max_drawdown_pct: f64,
}

/// Point-in-time view of the paper account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSnapshot {
    pub date: Option<NaiveDate>,
    pub cash: f64,
    pub net_liquidation: f64,
    pub gross_exposure: f64,
    pub leverage: f64,
    pub open_positions: usize,
    pub total_return_pct: f64,
    pub stats: PaperStats,
}

#[derive(Debug)]
struct PaperBook {
    starting_capital: f64,
    cash: f64,
    shares: HashMap<Instrument, f64>,
    /// Prices delivered for the current session
    session_prices: HashMap<Instrument, f64>,
    /// Most recent known price per instrument, for marking unpriced holdings
    last_prices: HashMap<Instrument, f64>,
    halted: HashSet<Instrument>,
    date: Option<NaiveDate>,
    stats: PaperStats,
}

impl PaperBook {
    fn mark(&self, instrument: &Instrument) -> f64 {
        self.last_prices.get(instrument).copied().unwrap_or(0.0)
    }

    fn gross_exposure(&self) -> f64 {
        self.shares
            .iter()
            .map(|(instrument, qty)| (qty * self.mark(instrument)).abs())
            .sum()
    }

    fn net_liquidation(&self) -> f64 {
        self.cash
            + self
                .shares
                .iter()
                .map(|(instrument, qty)| qty * self.mark(instrument))
                .sum::<f64>()
    }

    /// Gross exposure over net liquidation. A wiped-out account with open
    /// exposure reports infinite leverage rather than failing.
    fn leverage(&self) -> f64 {
        let gross_exposure = self.gross_exposure();
        let net_liquidation = self.net_liquidation();
        if net_liquidation > 0.0 {
            gross_exposure / net_liquidation
        } else if gross_exposure > 0.0 {
            warn!(net_liquidation, gross_exposure, "Paper account has no equity left");
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn update_drawdown(&mut self) {
        let value = self.net_liquidation();
        if value > self.stats.peak_value {
            self.stats.peak_value = value;
        } else if self.stats.peak_value > 0.0 {
            let drawdown = (self.stats.peak_value - value) / self.stats.peak_value * 100.0;
            if drawdown > self.stats.max_drawdown_pct {
                self.stats.max_drawdown_pct = drawdown;
            }
        }
    }
}

/// Simulated execution venue. Clones share the same account.
#[derive(Debug, Clone)]
pub struct PaperBroker {
    book: Arc<Mutex<PaperBook>>,
}

impl PaperBroker {
    pub fn new(starting_capital: f64) -> Self {
        info!("Paper broker initialized with {:.2} starting capital", starting_capital);
        Self {
            book: Arc::new(Mutex::new(PaperBook {
                starting_capital,
                cash: starting_capital,
                shares: HashMap::new(),
                session_prices: HashMap::new(),
                last_prices: HashMap::new(),
                halted: HashSet::new(),
                date: None,
                stats: PaperStats {
                    peak_value: starting_capital,
                    ..PaperStats::default()
                },
            })),
        }
    }

    /// Instruments the venue refuses to trade regardless of pricing
    pub fn with_halted<I, S>(self, halted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Instrument>,
    {
        if let Ok(mut book) = self.book.lock() {
            book.halted.extend(halted.into_iter().map(Into::into));
        }
        self
    }

    fn book(&self) -> Result<MutexGuard<'_, PaperBook>, ExecutionError> {
        self.book
            .lock()
            .map_err(|_| ExecutionError::AccountUnavailable("paper book lock poisoned".to_string()))
    }

    pub fn snapshot(&self) -> Result<PaperSnapshot, ExecutionError> {
        let book = self.book()?;
        let net_liquidation = book.net_liquidation();
        let gross_exposure = book.gross_exposure();
        Ok(PaperSnapshot {
            date: book.date,
            cash: book.cash,
            net_liquidation,
            gross_exposure,
            leverage: book.leverage(),
            open_positions: book.shares.len(),
            total_return_pct: (net_liquidation / book.starting_capital - 1.0) * 100.0,
            stats: book.stats.clone(),
        })
    }

    /// Current holding in shares, if any
    pub fn shares(&self, instrument: &Instrument) -> Option<f64> {
        self.book.lock().ok()?.shares.get(instrument).copied()
    }
}

#[async_trait]
impl ExecutionPort for PaperBroker {
    async fn observe_session(&self, frame: &DailyFrame) -> Result<(), ExecutionError> {
        let mut book = self.book()?;
        let prices = frame.prices();
        book.last_prices
            .extend(prices.iter().map(|(instrument, price)| (instrument.clone(), *price)));
        book.session_prices = prices;
        book.date = Some(frame.date);
        book.update_drawdown();
        debug!(
            date = %frame.date,
            priced = book.session_prices.len(),
            net_liquidation = book.net_liquidation(),
            "Paper book marked"
        );
        Ok(())
    }

    async fn can_trade(&self, instrument: &Instrument) -> Result<bool, ExecutionError> {
        let book = self.book()?;
        Ok(book.session_prices.contains_key(instrument) && !book.halted.contains(instrument))
    }

    async fn positions(&self) -> Result<HashMap<Instrument, f64>, ExecutionError> {
        Ok(self.book()?.shares.clone())
    }

    async fn leverage(&self) -> Result<f64, ExecutionError> {
        let book = self.book()?;
        let net_liquidation = book.net_liquidation();
        Ok(book.leverage())
    }

    async fn order_target_percent(
        &self,
        instrument: &Instrument,
        target: f64,
    ) -> Result<(), ExecutionError> {
        if !target.is_finite() {
            return Err(ExecutionError::InvalidTarget {
                instrument: instrument.clone(),
                weight: target,
            });
        }

        let mut book = self.book()?;
        if book.halted.contains(instrument) {
            return Err(ExecutionError::OrderRejected {
                instrument: instrument.clone(),
                reason: "instrument halted".to_string(),
            });
        }
        let price = book
            .session_prices
            .get(instrument)
            .copied()
            .ok_or_else(|| ExecutionError::NoPrice(instrument.clone()))?;

        let net_liquidation = book.net_liquidation();
        let current = book.shares.get(instrument).copied().unwrap_or(0.0);
        let desired = if target == 0.0 { 0.0 } else { target * net_liquidation / price };
        let delta = desired - current;
        if delta == 0.0 {
            return Ok(());
        }

        book.cash -= delta * price;
        if desired == 0.0 {
            book.shares.remove(instrument);
        } else {
            book.shares.insert(instrument.clone(), desired);
        }
        book.stats.orders_filled += 1;
        book.stats.turnover += (delta * price).abs();

        debug!(%instrument, shares = desired, delta, price, "Paper fill");
        Ok(())
    }
}
