//! I2C target transport for the panel's command set.
//!
//! The bus controller writes a request `[cmd, args...]` and then reads the
//! reply `[status, payload...]`. The reply to the last request stays
//! readable until the next write. Framing beyond that (addressing changes,
//! CRCs, retries) is left to the controller.

use embassy_stm32::{
    i2c::{self, I2c, SlaveAddrConfig, SlaveCommandKind},
    mode::Async,
};
use heapless::Vec;
use hopper_panel::{
    CommandDispatcher, PanelConfig,
    dispatcher::MAX_PACKET_LENGTH,
};

use crate::hardware::STATUS_LINE;
use crate::input::PANEL;

/// Switches the I2C peripheral into target mode at the configured address.
pub fn into_target(
    i2c: I2c<'static, Async, i2c::Master>,
    config: &PanelConfig,
) -> I2c<'static, Async, i2c::MultiMaster> {
    i2c.into_slave_multimaster(SlaveAddrConfig::basic(config.bus_address))
}

/// Async task serving bus requests.
///
/// Each controller write is dispatched as soon as it completes, so a status
/// request drains the counters exactly once no matter how often the reply
/// is read back. Bus errors drop the current transfer and the task keeps
/// listening.
///
/// # Arguments
///
/// * `i2c` - I2C peripheral in target mode (see [`into_target`])
#[embassy_executor::task]
pub async fn bus_task(mut i2c: I2c<'static, Async, i2c::MultiMaster>) {
    let dispatcher = CommandDispatcher::new(&PANEL, &STATUS_LINE);
    let mut request = [0u8; MAX_PACKET_LENGTH];
    let mut response: Vec<u8, MAX_PACKET_LENGTH> = Vec::new();

    loop {
        let command = match i2c.listen().await {
            Ok(command) => command,
            Err(_e) => {
                #[cfg(feature = "debug-mode")]
                defmt::warn!("Bus listen failed: {}", _e);
                continue;
            }
        };

        match command.kind {
            SlaveCommandKind::Write => match i2c.respond_to_write(&mut request).await {
                Ok(len) => {
                    response = dispatcher.handle_request(&request[..len]);

                    #[cfg(feature = "debug-mode")]
                    defmt::debug!("Request {=[u8]} -> {=[u8]}", &request[..len], &response[..]);
                }
                Err(_e) => {
                    #[cfg(feature = "debug-mode")]
                    defmt::warn!("Bus write failed: {}", _e);
                }
            },
            SlaveCommandKind::Read => {
                if let Err(_e) = i2c.respond_to_read(&response).await {
                    #[cfg(feature = "debug-mode")]
                    defmt::warn!("Bus read failed: {}", _e);
                }
            }
        }
    }
}
