pub mod filter_bank;
pub mod frequency_scale;
pub mod kalman;
pub mod partial;
pub mod ring_buffer;
pub mod utils;
pub mod wiener_soft_masking;

pub use filter_bank::{
    fix_small_triangles, Direction, Filter, FilterBank, FilterBankCache, FilterBankKey,
    FilterBankObj,
};
pub use frequency_scale::{FrequencyScale, Scale};
pub use kalman::{KalmanParams, ScalarKalmanFilter};
pub use partial::{
    Amplitude, Partial, PartialId, PartialIdAllocator, PartialState, Qifft, ZombiePolicy,
};
pub use ring_buffer::RingBuffer;
pub use wiener_soft_masking::{HistoryLine, SpectralHistory, WienerConfig, WienerSoftMasking};
