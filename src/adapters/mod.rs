//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements          | Connects to                    |
//! |--------------|---------------------|--------------------------------|
//! | `display`    | DisplayPort         | In-memory 20×4 character grid  |
//! | `hardware`   | ActuatorPort        | `embedded-hal` PWM and GPIO    |
//! |              | all hardware ports  | Sensor + fan + outputs bundle  |
//! | `log_sink`   | EventSink           | `log` facade                   |
//! | `serial`     | SerialPort          | In-memory byte queues          |
//! | `sim`        | HumiditySensorPort  | Plant model                    |
//! |              | FanControllerPort   |                                |
//! | `storage`    | StoragePort         | HashMap / files on disk        |
//! | `time`       | (clock source)      | `std::time::Instant`           |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod serial;
pub mod sim;
pub mod storage;
pub mod time;
