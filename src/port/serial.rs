//! Local serial transport (§4.1): a device path plus line parameters,
//! backed by `tokio-serial` for native async RS-485.

use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::error::PortError;

use super::PortId;

#[derive(Debug, Clone, PartialEq)]
pub struct SerialParams {
    pub device_path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            device_path: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

pub(super) async fn open(port_id: PortId, params: &SerialParams) -> Result<SerialStream, PortError> {
    tokio_serial::new(&params.device_path, params.baud_rate)
        .data_bits(params.data_bits)
        .parity(params.parity)
        .stop_bits(params.stop_bits)
        .flow_control(params.flow_control)
        .open_native_async()
        .map_err(|e| PortError::Unavailable {
            port_id,
            cause: e.to_string(),
        })
}
