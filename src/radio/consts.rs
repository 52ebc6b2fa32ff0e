//! SX127x LoRa register map (subset) and register values.

use std::time::Duration;

pub const REG_FIFO:              u8 = 0x00; // "RegFifo", reads/writes don't auto-increment
pub const REG_OP_MODE:           u8 = 0x01; // "RegOpMode"
pub const REG_FRF_MSB:           u8 = 0x06; // "RegFrfMsb", followed by RegFrfMid and RegFrfLsb
pub const REG_FRF_MID:           u8 = 0x07;
pub const REG_FRF_LSB:           u8 = 0x08;
pub const REG_PA_CONFIG:         u8 = 0x09; // "RegPaConfig"
pub const REG_FIFO_ADDR_PTR:     u8 = 0x0d; // "RegFifoAddrPtr"
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0e; // "RegFifoTxBaseAddr"
pub const REG_IRQ_FLAGS:         u8 = 0x12; // "RegIrqFlags", write 1 to clear
pub const REG_PAYLOAD_LENGTH:    u8 = 0x22; // "RegPayloadLength"

// RegOpMode
pub const MODE_LONG_RANGE: u8 = 0b1000_0000; // LoRa; only writable in sleep mode
pub const MODE_SLEEP:      u8 = 0b0000_0000;
pub const MODE_STANDBY:    u8 = 0b0000_0001;
pub const MODE_TX:         u8 = 0b0000_0011;

// RegPaConfig
pub const PA_SELECT_BOOST: u8 = 0b1000_0000; // PA_BOOST pin instead of RFO

// RegIrqFlags
pub const IRQ_RX_DONE: u8 = 0b0100_0000;
pub const IRQ_TX_DONE: u8 = 0b0000_1000;

/// crystal oscillator; frequency step is FXOSC / 2^19
pub const FXOSC: u64 = 32_000_000;

/// RegFrf for 915 MHz
pub const FREQUENCY_915_MHZ: u32 = 0xe4_c000;

pub const MAX_PAYLOAD_LENGTH: usize = 255;

/// pause between two reads of RegIrqFlags while waiting for TxDone
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
