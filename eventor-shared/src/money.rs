use rust_decimal::{Decimal, RoundingStrategy};

/// Settlement currency for every booking and payment (Ghana cedi).
pub const CURRENCY: &str = "GHS";

/// Pesewas per cedi, i.e. two decimal places.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to whole pesewas, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `amount` is expressible in whole pesewas.
pub fn is_whole_pesewas(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}
