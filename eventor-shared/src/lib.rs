pub mod money;
pub mod pii;

pub use money::{is_whole_pesewas, round_money, CURRENCY};
pub use pii::Masked;
