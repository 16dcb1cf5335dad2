// src/services/candidate_selector.rs
use std::borrow::Borrow;
use std::collections::HashSet;

use crate::{
    models::{donation::DonationEvent, user::UserRecord},
    utils::geo::distance_km,
};

/// Users within this great-circle distance of a donation are notified.
pub const NOTIFY_RADIUS_KM: f64 = 5.0;

/// Push tokens of every addressable user within `radius_km` of the donation.
///
/// Users are consumed lazily, so a paginating store can feed this directly.
/// Tokens are returned once each, in first-seen order. A donation without
/// coordinates selects nobody.
pub fn select_recipients<I>(event: &DonationEvent, users: I, radius_km: f64) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Borrow<UserRecord>,
{
    let Some((lat, lon)) = event.coordinates() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for user in users {
        let Some((user_lat, user_lon, token)) = user.borrow().address() else {
            continue;
        };

        if distance_km(lat, lon, user_lat, user_lon) <= radius_km && seen.insert(token.to_string()) {
            tokens.push(token.to_string());
        }
    }

    tracing::debug!("Selected {} recipients within {} km", tokens.len(), radius_km);
    tokens
}
