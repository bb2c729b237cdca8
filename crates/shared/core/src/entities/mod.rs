mod candle;
mod decision;
mod funding;
mod scan_result;
mod symbol;
mod ticker;

pub use candle::{Candle, into_chronological};
pub use decision::Decision;
pub use funding::FundingSnapshot;
pub use scan_result::ScanResult;
pub use symbol::{SymbolId, is_leveraged_base, parse_symbol_list};
pub use ticker::TickerUpdate;
