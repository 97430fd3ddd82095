/// Minimum number of ring slots: one in flight, one look-ahead, one for the caller.
pub const MIN_SLOTS: usize = 3;

/// Minimum words per slot accepted by the ring engine itself.
pub const MIN_WORDS_PER_SLOT: usize = 2;

/// Minimum words per slot accepted by the I2S layer (headroom for ISR latency).
pub const MIN_BUFFER_WORDS: usize = 8;

/// Default words per slot for a new I2S stream.
pub const DEFAULT_BUFFER_WORDS: usize = 16;

/// Default number of slots for a new I2S stream.
pub const DEFAULT_BUFFER_COUNT: usize = 8;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default bit clock pin. LRCLK is always the next pin up.
pub const DEFAULT_BCLK_PIN: u8 = 26;

/// Default data pin.
pub const DEFAULT_DATA_PIN: u8 = 28;

/// Highest usable bit clock pin (LRCLK occupies `bclk + 1`).
pub const MAX_BCLK_PIN: u8 = 28;

/// Highest usable data pin.
pub const MAX_DATA_PIN: u8 = 29;

/// Number of transfer channels the shared interrupt registry can track.
pub const MAX_DMA_CHANNELS: usize = 32;
