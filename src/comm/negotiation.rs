//! Peer-to-peer energy offers and the resulting trade ledger.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::message::now_secs;
use crate::agent::AgentId;

/// Lifecycle of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Energy remains available.
    Open,
    /// Fully sold.
    Completed,
}

/// Energy put up for sale by one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    /// `"{seller_id}_{timestamp}"`.
    pub offer_id: String,
    /// Selling agent.
    pub seller_id: AgentId,
    /// Energy still available (kWh). Only ever decreases.
    pub energy_kwh: f32,
    /// Energy offered at creation (kWh).
    pub original_kwh: f32,
    /// Asking price per kWh.
    pub price_per_kwh: f32,
    /// Current status.
    pub status: OfferStatus,
    /// Creation time in seconds.
    pub timestamp: f64,
}

/// An executed (possibly partial) acceptance of an offer. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    /// Offer the trade settled against.
    pub offer_id: String,
    /// Selling agent.
    pub seller_id: AgentId,
    /// Buying agent.
    pub buyer_id: AgentId,
    /// Energy actually transferred (kWh).
    pub energy_kwh: f32,
    /// Price per kWh.
    pub price_per_kwh: f32,
    /// `energy_kwh * price_per_kwh`.
    pub total_cost: f32,
    /// Settlement time in seconds.
    pub timestamp: f64,
}

/// Order book of energy offers with a completed-trade ledger.
#[derive(Debug, Default, Clone)]
pub struct EnergyNegotiator {
    offers: Vec<Offer>,
    index: HashMap<String, usize>,
    trades: Vec<Trade>,
}

impl EnergyNegotiator {
    /// Creates an empty negotiator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an offer stamped with the current wall-clock time and returns its id.
    pub fn create_offer(&mut self, seller_id: AgentId, energy_kwh: f32, price_per_kwh: f32) -> String {
        self.create_offer_at(seller_id, energy_kwh, price_per_kwh, now_secs())
    }

    /// Opens an offer at an explicit timestamp and returns its id.
    ///
    /// Ids have the form `"{seller_id}_{timestamp}"`; a numeric suffix is
    /// appended if the same seller already opened an offer at that instant.
    pub fn create_offer_at(
        &mut self,
        seller_id: AgentId,
        energy_kwh: f32,
        price_per_kwh: f32,
        timestamp: f64,
    ) -> String {
        let base = format!("{seller_id}_{timestamp}");
        let mut offer_id = base.clone();
        let mut n = 1;
        while self.index.contains_key(&offer_id) {
            offer_id = format!("{base}_{n}");
            n += 1;
        }

        let energy_kwh = energy_kwh.max(0.0);
        self.index.insert(offer_id.clone(), self.offers.len());
        self.offers.push(Offer {
            offer_id: offer_id.clone(),
            seller_id,
            energy_kwh,
            original_kwh: energy_kwh,
            price_per_kwh,
            status: OfferStatus::Open,
            timestamp,
        });
        debug!(%offer_id, seller_id, energy_kwh, price_per_kwh, "offer created");
        offer_id
    }

    /// Accepts up to `amount_kwh` of an offer at the current wall-clock time.
    ///
    /// Returns `false` if the offer is unknown or no longer open.
    pub fn accept_offer(&mut self, offer_id: &str, buyer_id: AgentId, amount_kwh: f32) -> bool {
        self.accept_offer_at(offer_id, buyer_id, amount_kwh, now_secs())
    }

    /// Accepts up to `amount_kwh` of an offer at an explicit timestamp.
    ///
    /// The amount is clamped to the energy remaining on the offer; the trade
    /// records what was actually transferred. The offer completes once its
    /// remaining energy reaches zero.
    pub fn accept_offer_at(
        &mut self,
        offer_id: &str,
        buyer_id: AgentId,
        amount_kwh: f32,
        timestamp: f64,
    ) -> bool {
        let Some(&idx) = self.index.get(offer_id) else {
            return false;
        };
        let offer = &mut self.offers[idx];
        if offer.status != OfferStatus::Open {
            return false;
        }

        let amount_kwh = amount_kwh.clamp(0.0, offer.energy_kwh);
        let trade = Trade {
            offer_id: offer.offer_id.clone(),
            seller_id: offer.seller_id,
            buyer_id,
            energy_kwh: amount_kwh,
            price_per_kwh: offer.price_per_kwh,
            total_cost: amount_kwh * offer.price_per_kwh,
            timestamp,
        };

        offer.energy_kwh -= amount_kwh;
        if offer.energy_kwh <= 0.0 {
            offer.status = OfferStatus::Completed;
        }

        debug!(
            offer_id,
            seller_id = trade.seller_id,
            buyer_id,
            energy_kwh = amount_kwh,
            "trade settled"
        );
        self.trades.push(trade);
        true
    }

    /// Open offers, optionally capped by price, in creation order.
    pub fn get_available_offers(&self, max_price: Option<f32>) -> Vec<&Offer> {
        self.offers
            .iter()
            .filter(|o| o.status == OfferStatus::Open)
            .filter(|o| max_price.is_none_or(|max| o.price_per_kwh <= max))
            .collect()
    }

    /// Looks up an offer by id.
    pub fn offer(&self, offer_id: &str) -> Option<&Offer> {
        self.index.get(offer_id).map(|&idx| &self.offers[idx])
    }

    /// Completed trades in settlement order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Sum of traded energy across the ledger (kWh).
    pub fn traded_energy_kwh(&self) -> f32 {
        self.trades.iter().map(|t| t.energy_kwh).sum()
    }
}
