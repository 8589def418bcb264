//! Fake banking-data provider
//!
//! Links synthetic accounts and fills them with three months of
//! account-type-conditioned history. Randomness comes from an explicit
//! `StdRng` owned by each [`Synthesizer`], so a given seed always yields
//! the same transactions.

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Account, AccountType, NewTransaction};

mod plaid;

pub use plaid::{
    pfc_primary, PlaidAccount, PlaidBalances, PlaidItem, PlaidLocation, PlaidPaymentMeta,
    PlaidPersonalFinanceCategory, PlaidTransaction, PlaidTransactionsRequest,
    PlaidTransactionsResponse, DEFAULT_PLAID_LIMIT, MAX_PLAID_LIMIT,
};

/// Environment variable overriding the base synthesis seed
pub const SEED_ENV: &str = "PLUTO_SYNTH_SEED";
/// Base seed used when `PLUTO_SYNTH_SEED` is unset
pub const DEFAULT_SEED: u64 = 123;

/// Months of history generated per linked account
const MONTHS: i64 = 3;

const SUBSCRIPTIONS: &[&str] = &["Netflix", "Spotify", "iCloud", "Amazon Prime"];
const GROCERY_DAYS: &[u32] = &[5, 12, 19, 26];
const DINING_DAYS: &[u32] = &[4, 8, 11, 13, 17, 20, 23, 27];
const RESTAURANTS: &[&str] = &["PastaPlace", "BurgerHub", "SushiGo", "TacoBell", "McDonalds"];
const TRANSPORT_DAYS: &[u32] = &[2, 6, 9, 14, 16, 18, 21, 24, 28];
const TRANSPORT_SERVICES: &[&str] = &["Uber", "Lyft", "MetroCard", "Shell", "Exxon"];
const SYMBOLS: &[&str] = &["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN", "NVDA", "META"];

/// Read the base seed from the environment, falling back to [`DEFAULT_SEED`]
pub fn base_seed_from_env() -> u64 {
    std::env::var(SEED_ENV)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

/// Human-facing mask for a linking username
///
/// Last 4 characters, or the username left-padded with `0` when shorter.
pub fn mask_for(username: &str) -> String {
    let chars: Vec<char> = username.chars().collect();
    if chars.len() >= 4 {
        chars[chars.len() - 4..].iter().collect()
    } else {
        format!("{:0>4}", username)
    }
}

/// Seed for one (user, account type, mask) link, mixed into the base seed
///
/// FNV-1a over the link identity so the result is stable across builds.
pub fn link_seed(base: u64, user_id: i64, account_type: AccountType, mask: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET ^ base;
    let bytes = user_id
        .to_le_bytes()
        .into_iter()
        .chain(account_type.as_str().bytes())
        .chain(mask.bytes());
    for b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Anchor date for a month offset: first of the current month minus 30 days per offset
fn month_anchor(today: NaiveDate, offset: i64) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first - Duration::days(30 * offset)
}

/// `anchor` moved to `day` of its month (all generated days are <= 28)
fn on_day(anchor: NaiveDate, day: u32) -> NaiveDate {
    anchor.with_day(day).unwrap_or(anchor)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn entry(date: NaiveDate, amount: f64, category: &str, description: String) -> NewTransaction {
    NewTransaction {
        date,
        amount,
        category: Some(category.to_string()),
        description: Some(description),
    }
}

/// A request to link a fake institution account
#[derive(Debug, Clone)]
pub struct LinkRequest {
    pub username: String,
    pub account_type: AccountType,
    pub nickname: Option<String>,
}

/// Seeded generator of synthetic transaction histories
pub struct Synthesizer {
    rng: StdRng,
}

impl Synthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform amount in `[lo, hi]`, rounded to cents
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        round_cents(self.rng.gen_range(lo..=hi))
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())]
    }

    /// Pick an institution name for the account type
    pub fn institution(&mut self, account_type: AccountType) -> &'static str {
        let names: &[&'static str] = match account_type {
            AccountType::Checking => &["Chase Bank", "Bank of America", "Wells Fargo", "Citibank"],
            AccountType::Savings => &[
                "Ally Bank",
                "Marcus by Goldman Sachs",
                "Discover Bank",
                "Capital One",
            ],
            AccountType::Trading => &["Robinhood", "TD Ameritrade", "E*TRADE", "Charles Schwab"],
        };
        self.pick(names)
    }

    /// Generate three months of history ending in the month of `today`
    pub fn generate(&mut self, account_type: AccountType, today: NaiveDate) -> Vec<NewTransaction> {
        let mut out = Vec::new();

        if account_type == AccountType::Trading {
            out.push(entry(
                today - Duration::days(90),
                10000.00,
                "deposit",
                "Initial trading account deposit".to_string(),
            ));
        }

        for offset in 0..MONTHS {
            let anchor = month_anchor(today, offset);
            match account_type {
                AccountType::Checking => self.checking_month(anchor, &mut out),
                AccountType::Savings => self.savings_month(anchor, &mut out),
                AccountType::Trading => self.trading_month(anchor, &mut out),
            }
        }

        out
    }

    fn checking_month(&mut self, anchor: NaiveDate, out: &mut Vec<NewTransaction>) {
        out.push(entry(
            on_day(anchor, 1),
            3500.00,
            "salary",
            "Monthly salary from Employer Inc".to_string(),
        ));
        out.push(entry(
            on_day(anchor, 3),
            -1100.00,
            "rent",
            "Monthly rent to My Landlord LLC".to_string(),
        ));

        let utilities = self.uniform(90.0, 140.0);
        out.push(entry(
            on_day(anchor, 15),
            -utilities,
            "utilities",
            "City Utilities".to_string(),
        ));

        for name in SUBSCRIPTIONS {
            let amount = self.uniform(5.0, 20.0);
            out.push(entry(
                on_day(anchor, 10),
                -amount,
                "subscriptions",
                format!("{} subscription", name),
            ));
        }

        for &day in GROCERY_DAYS {
            let amount = self.uniform(40.0, 120.0);
            out.push(entry(
                on_day(anchor, day),
                -amount,
                "groceries",
                "SuperMart groceries".to_string(),
            ));
        }

        let dining_count = self.rng.gen_range(2..=5);
        for _ in 0..dining_count {
            let day = self.pick(DINING_DAYS);
            let amount = self.uniform(12.0, 40.0);
            let restaurant = self.pick(RESTAURANTS);
            out.push(entry(
                on_day(anchor, day),
                -amount,
                "dining",
                restaurant.to_string(),
            ));
        }

        for _ in 0..6 {
            let day = self.pick(TRANSPORT_DAYS);
            let amount = self.uniform(8.0, 25.0);
            let service = self.pick(TRANSPORT_SERVICES);
            out.push(entry(
                on_day(anchor, day),
                -amount,
                "transport",
                service.to_string(),
            ));
        }
    }

    fn savings_month(&mut self, anchor: NaiveDate, out: &mut Vec<NewTransaction>) {
        let deposit = self.uniform(500.0, 1000.0);
        out.push(entry(
            on_day(anchor, 1),
            deposit,
            "savings",
            "Monthly savings deposit".to_string(),
        ));

        let interest = self.uniform(5.0, 15.0);
        out.push(entry(
            on_day(anchor, 15),
            interest,
            "interest",
            "Monthly interest earned".to_string(),
        ));

        if self.rng.gen_bool(0.3) {
            let day = self.rng.gen_range(10..=25);
            let amount = self.uniform(100.0, 300.0);
            out.push(entry(
                on_day(anchor, day),
                -amount,
                "withdrawal",
                "Savings withdrawal".to_string(),
            ));
        }
    }

    fn trading_month(&mut self, anchor: NaiveDate, out: &mut Vec<NewTransaction>) {
        let trades = self.rng.gen_range(3..=8);
        for _ in 0..trades {
            let day = self.rng.gen_range(1..=28);
            let symbol = self.pick(SYMBOLS);
            let amount = self.uniform(100.0, 500.0);
            if self.rng.gen_bool(0.6) {
                out.push(entry(
                    on_day(anchor, day),
                    -amount,
                    "investment",
                    format!("Purchase {} shares", symbol),
                ));
            } else {
                out.push(entry(
                    on_day(anchor, day),
                    amount,
                    "investment",
                    format!("Sell {} shares", symbol),
                ));
            }
        }

        if self.rng.gen_bool(0.4) {
            let day = self.rng.gen_range(10..=20);
            let amount = self.uniform(10.0, 50.0);
            out.push(entry(
                on_day(anchor, day),
                amount,
                "dividend",
                "Stock dividend payment".to_string(),
            ));
        }
    }
}

impl Database {
    /// Link a fake account for `user_id`, generating its history on first link
    ///
    /// Idempotent per (user, account type, mask): a repeat link returns the
    /// existing account untouched. Returns the account and whether it was created.
    pub fn link_fake_account(
        &self,
        user_id: i64,
        request: &LinkRequest,
        base_seed: u64,
        today: NaiveDate,
    ) -> Result<(Account, bool)> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(Error::InvalidData("username must not be empty".to_string()));
        }

        let mask = mask_for(username);
        if let Some(existing) = self.find_linked_account(user_id, request.account_type, &mask)? {
            debug!(user_id, account_id = existing.id, mask = %mask, "Account already linked");
            return Ok((existing, false));
        }

        let mut synth = Synthesizer::new(link_seed(base_seed, user_id, request.account_type, &mask));
        let name = format!(
            "{} {}",
            synth.institution(request.account_type),
            request.account_type.label()
        );
        let generated = synth.generate(request.account_type, today);

        // Concurrent links of the same account serialize on the write lock;
        // the loser finds the winner's row in the re-check below
        let conn = self.conn()?;
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| {
            let linked: Option<i64> = conn
                .query_row(
                    "SELECT id FROM accounts WHERE user_id = ? AND account_type = ? AND mask = ? ORDER BY id LIMIT 1",
                    params![user_id, request.account_type.as_str(), mask],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(account_id) = linked {
                return Ok((account_id, false));
            }

            conn.execute(
                r#"
                INSERT INTO accounts (user_id, name, nickname, currency, account_type, mask, balance)
                VALUES (?, ?, ?, 'USD', ?, ?, 0)
                "#,
                params![
                    user_id,
                    name,
                    request.nickname,
                    request.account_type.as_str(),
                    mask
                ],
            )?;
            let account_id = conn.last_insert_rowid();

            let mut balance = 0.0;
            for tx in &generated {
                crate::db::insert_transaction_row(&conn, user_id, account_id, tx)?;
                balance += tx.amount;
            }
            let balance = round_cents(balance);

            conn.execute(
                "UPDATE accounts SET balance = ? WHERE id = ?",
                params![balance, account_id],
            )?;
            Ok::<_, rusqlite::Error>((account_id, true))
        })();

        let (account_id, created) = match result {
            Ok(outcome) => {
                conn.execute("COMMIT", [])?;
                outcome
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                return Err(e.into());
            }
        };
        drop(conn);

        if created {
            info!(
                user_id,
                account_id,
                account_type = %request.account_type,
                transactions = generated.len(),
                "Linked fake account"
            );
        } else {
            debug!(user_id, account_id, mask = %mask, "Account linked concurrently");
        }

        let account = self
            .get_account(user_id, account_id)?
            .ok_or_else(|| Error::NotFound(format!("Account {} vanished after link", account_id)))?;
        Ok((account, created))
    }
}
