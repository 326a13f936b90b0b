//! Audio input device enumeration.

use cpal::traits::{DeviceTrait, HostTrait};

use voicenote_core::models::device::InputDevice;
use voicenote_core::models::error::CaptureError;

/// The system default input device, or `DeviceNotFound`.
pub fn default_input() -> Result<cpal::Device, CaptureError> {
    cpal::default_host()
        .default_input_device()
        .ok_or(CaptureError::DeviceNotFound)
}

/// Find an input device by name, falling back to the system default.
pub fn input_by_name(name: &str) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();
    let found = host
        .input_devices()
        .map_err(|_| CaptureError::UnsupportedEnvironment)?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false));
    match found {
        Some(device) => Ok(device),
        None => host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotFound),
    }
}

/// List all available audio input devices.
pub fn list_inputs() -> Result<Vec<InputDevice>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|_| CaptureError::UnsupportedEnvironment)?;

    let mut inputs = Vec::new();
    for device in devices {
        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown input".to_string());
        let is_default = default_name.as_deref() == Some(name.as_str());
        inputs.push(InputDevice {
            id: name.clone(),
            name,
            is_default,
        });
    }
    Ok(inputs)
}
