//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements  | Connects to               |
//! |-------------|-------------|---------------------------|
//! | `ble`       | StatusPort  | Bluedroid GATT server     |
//! |             | LinkPort    | GAP/GATTS connect events  |
//! | `log_sink`  | EventSink   | Serial log output         |
//! | `time`      | ClockPort   | ESP32 system timer        |
//! | `device_id` |             | BT MAC → advertised name  |

pub mod ble;
pub mod device_id;
pub mod log_sink;
pub mod time;
