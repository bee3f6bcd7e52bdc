//! Client-side totals shown before the server computes the real ones

use crate::api::HomeService;

/// Tax applied to every booking, in percent
pub const TAX_RATE_PERCENT: i64 = 11;

/// Subtotal, tax and grand total in Rupiah
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub sub_total: i64,
    pub tax: i64,
    pub total: i64,
}

impl Totals {
    /// Totals for a non-negative subtotal; tax is rounded half up
    pub fn from_subtotal(sub_total: i64) -> Self {
        let tax = (sub_total * TAX_RATE_PERCENT + 50).div_euclid(100);
        Self {
            sub_total,
            tax,
            total: sub_total + tax,
        }
    }

    /// Totals for the listed prices of `services`
    pub fn from_services(services: &[HomeService]) -> Self {
        Self::from_subtotal(services.iter().map(|s| s.price).sum())
    }
}

/// Format as Indonesian Rupiah, e.g. `Rp 111.000`
pub fn format_idr(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}
