//! Batch lifecycle manager: owns every [`TbyBatch`] and decides which
//! batch a swap-in lands in.
//!
//! ```text
//!   swap-in at t
//!        │
//!        ▼
//!   any batch? ──no──▶ open TBY 0
//!        │yes
//!        ▼
//!   latest ACTIVE, not yet mature,
//!   and t - last_activity <= window? ──no──▶ open latest + 1
//!        │yes
//!        ▼
//!   continue latest
//! ```
//!
//! Ids are strictly increasing from zero and never reused. Batches are
//! never deleted; only the latest one can still receive swap-ins.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tbyswap_types::{AccountId, MaturityState, Result, TbyError, TbyId, TbyBatch, Wad};

/// Where a swap-in at a given instant lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchResolution {
    /// A new batch must be opened under this id.
    New(TbyId),
    /// The latest batch is extended.
    Continue(TbyId),
}

impl BatchResolution {
    #[must_use]
    pub fn id(self) -> TbyId {
        match self {
            Self::New(id) | Self::Continue(id) => id,
        }
    }

    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Registry of all batches of one pool.
#[derive(Debug, Clone)]
pub struct BatchLifecycleManager {
    batches: BTreeMap<TbyId, TbyBatch>,
    last_minted: Option<TbyId>,
    maturity: Duration,
    batch_window: Duration,
}

impl BatchLifecycleManager {
    #[must_use]
    pub fn new(maturity: Duration, batch_window: Duration) -> Self {
        Self {
            batches: BTreeMap::new(),
            last_minted: None,
            maturity,
            batch_window,
        }
    }

    /// Decide whether a swap-in at `now` extends the latest batch or opens
    /// a new one. Pure; nothing is recorded.
    #[must_use]
    pub fn resolve_batch_id(&self, now: DateTime<Utc>) -> BatchResolution {
        let Some(latest) = self.last_minted.and_then(|id| self.batches.get(&id)) else {
            return BatchResolution::New(TbyId::GENESIS);
        };
        let accepting = latest.maturity_state == MaturityState::Active
            && latest.age(now) < self.maturity
            && latest.idle_for(now) <= self.batch_window;
        if accepting {
            BatchResolution::Continue(latest.id)
        } else {
            BatchResolution::New(latest.id.next())
        }
    }

    /// Open the next batch at `start_price` and return its id.
    pub fn open_batch(&mut self, start_price: Wad, now: DateTime<Utc>) -> TbyId {
        let id = self.last_minted.map_or(TbyId::GENESIS, TbyId::next);
        self.batches.insert(id, TbyBatch::open(id, start_price, now));
        self.last_minted = Some(id);
        tracing::info!(%id, start_price = %start_price, "Batch opened");
        id
    }

    /// Add swapped-in collateral and principal to batch `id`.
    ///
    /// # Errors
    /// `InvalidTby` for an unknown batch, `TbyMatured` for a matured one,
    /// `TbyAlreadyRedeemable` for a redeemable one.
    pub fn record_swap_in(
        &mut self,
        id: TbyId,
        rwa_amount: u128,
        lender_principal: u128,
        borrower_principal: &BTreeMap<AccountId, u128>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let batch = self.batch_mut(id)?;
        match batch.maturity_state {
            MaturityState::Active => {}
            MaturityState::Matured => return Err(TbyError::TbyMatured(id)),
            MaturityState::Redeemable => return Err(TbyError::TbyAlreadyRedeemable(id)),
        }
        let rwa = batch
            .collateral
            .rwa_amount
            .checked_add(rwa_amount)
            .ok_or(TbyError::MathOverflow)?;
        let lender = batch
            .lender_principal
            .checked_add(lender_principal)
            .ok_or(TbyError::MathOverflow)?;
        for (borrower, amount) in borrower_principal {
            let entry = batch.borrower_principal.entry(*borrower).or_default();
            *entry = entry.checked_add(*amount).ok_or(TbyError::MathOverflow)?;
        }
        batch.collateral.rwa_amount = rwa;
        batch.lender_principal = lender;
        batch.last_activity_timestamp = now;
        Ok(())
    }

    /// Move batch `id` to `Matured` once its age reaches the maturity
    /// period. Idempotent; returns the state after the check.
    pub fn mark_matured(&mut self, id: TbyId, now: DateTime<Utc>) -> Result<MaturityState> {
        let maturity = self.maturity;
        let batch = self.batch_mut(id)?;
        if batch.maturity_state == MaturityState::Active && batch.age(now) >= maturity {
            batch.transition(MaturityState::Matured)?;
            tracing::info!(%id, "Batch matured");
        }
        Ok(batch.maturity_state)
    }

    /// Move batch `id` from `Matured` to `Redeemable`. Requires its RWA
    /// collateral to be fully swapped out.
    ///
    /// # Errors
    /// `InvalidTby`, `TbyNotMatured` if still active or RWA remains,
    /// `TbyAlreadyRedeemable` if already terminal.
    pub fn mark_redeemable(&mut self, id: TbyId) -> Result<()> {
        let batch = self.batch_mut(id)?;
        if batch.maturity_state == MaturityState::Matured && batch.collateral.rwa_amount != 0 {
            return Err(TbyError::TbyNotMatured(id));
        }
        batch.transition(MaturityState::Redeemable)?;
        tracing::info!(
            %id,
            asset_amount = batch.collateral.asset_amount,
            "Batch redeemable"
        );
        Ok(())
    }

    /// Look up a batch.
    pub fn batch(&self, id: TbyId) -> Result<&TbyBatch> {
        self.batches.get(&id).ok_or(TbyError::InvalidTby(id))
    }

    pub(crate) fn batch_mut(&mut self, id: TbyId) -> Result<&mut TbyBatch> {
        self.batches.get_mut(&id).ok_or(TbyError::InvalidTby(id))
    }

    /// Highest id ever opened, `None` before the first swap-in.
    #[must_use]
    pub fn last_minted_id(&self) -> Option<TbyId> {
        self.last_minted
    }

    /// All batches in id order.
    pub fn batches(&self) -> impl Iterator<Item = &TbyBatch> {
        self.batches.values()
    }

    #[must_use]
    pub fn maturity(&self) -> Duration {
        self.maturity
    }

    #[must_use]
    pub fn batch_window(&self) -> Duration {
        self.batch_window
    }
}
