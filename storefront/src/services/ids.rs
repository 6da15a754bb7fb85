// ishop/src/services/ids.rs

//! Human-readable entity codes (`P12ABCDE34`, `ORDX7K2Q`, `CAT0007`, ...).
//!
//! Every scheme goes through `IdScheme::allocate`, which proposes candidates
//! and checks them against the store until one is free or the attempt budget
//! runs out.

use crate::errors::{AppError, Result};
use crate::store::{CodeKind, Store};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, instrument, warn};

pub const MAX_ATTEMPTS: u32 = 16;

const DIGITS: &[u8] = b"0123456789";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const BASE36_UPPER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy)]
pub enum IdKind {
  /// Body produced by a random generator; collisions are retried.
  Random(fn() -> String),
  /// Zero-padded value from a named store sequence.
  Sequential { counter: &'static str, width: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct IdScheme {
  pub prefix: &'static str,
  pub kind: IdKind,
  pub target: CodeKind,
}

pub const PRODUCT: IdScheme = IdScheme {
  prefix: "P",
  kind: IdKind::Random(product_body),
  target: CodeKind::Product,
};

pub const ORDER: IdScheme = IdScheme {
  prefix: "ORD",
  kind: IdKind::Random(order_body),
  target: CodeKind::Order,
};

pub const USER: IdScheme = IdScheme {
  prefix: "USR-",
  kind: IdKind::Random(user_body),
  target: CodeKind::User,
};

pub const CATEGORY: IdScheme = IdScheme {
  prefix: "CAT",
  kind: IdKind::Sequential { counter: "category", width: 4 },
  target: CodeKind::Category,
};

pub const DEAL: IdScheme = IdScheme {
  prefix: "TDE",
  kind: IdKind::Sequential { counter: "deal", width: 4 },
  target: CodeKind::Deal,
};

pub const CAROUSEL: IdScheme = IdScheme {
  prefix: "CAR",
  kind: IdKind::Sequential { counter: "carousel", width: 3 },
  target: CodeKind::Carousel,
};

impl IdScheme {
  async fn candidate(&self, store: &dyn Store) -> Result<String> {
    let body = match self.kind {
      IdKind::Random(generate) => generate(),
      IdKind::Sequential { counter, width } => {
        let n = store.next_sequence(counter).await?;
        format!("{:0width$}", n, width = width)
      }
    };
    Ok(format!("{}{}", self.prefix, body))
  }

  /// Returns a code not yet used in the scheme's table.
  #[instrument(name = "ids::allocate", skip(self, store), fields(prefix = self.prefix))]
  pub async fn allocate(&self, store: &dyn Store) -> Result<String> {
    for attempt in 1..=MAX_ATTEMPTS {
      let code = self.candidate(store).await?;
      if !store.code_taken(self.target, &code).await? {
        debug!(%code, attempt, "Allocated identifier.");
        return Ok(code);
      }
      debug!(%code, attempt, "Identifier collision, retrying.");
    }
    warn!(prefix = self.prefix, "Identifier allocation exhausted its attempts.");
    Err(AppError::IdSpaceExhausted {
      prefix: self.prefix,
      attempts: MAX_ATTEMPTS,
    })
  }
}

// The generators never cross an await, so the thread-local rng stays out of
// the allocation future.
fn pick(rng: &mut impl Rng, alphabet: &[u8], count: usize) -> String {
  (0..count)
    .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
    .collect()
}

/// 2 digits, 5 alphanumerics, 2 digits.
pub fn product_body() -> String {
  let mut rng = rand::thread_rng();
  let mut body = pick(&mut rng, DIGITS, 2);
  body.push_str(&pick(&mut rng, ALPHANUMERIC, 5));
  body.push_str(&pick(&mut rng, DIGITS, 2));
  body
}

/// 5 to 7 alphanumerics.
pub fn order_body() -> String {
  let mut rng = rand::thread_rng();
  let len = rng.gen_range(5..=7);
  pick(&mut rng, ALPHANUMERIC, len)
}

/// `YYYYMMDD-` followed by 6 upper-case base36 characters.
pub fn user_body() -> String {
  let mut rng = rand::thread_rng();
  format!("{}-{}", Utc::now().format("%Y%m%d"), pick(&mut rng, BASE36_UPPER, 6))
}
