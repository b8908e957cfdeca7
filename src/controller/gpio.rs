//! Raspberry Pi input hardware
//!
//! Rotary encoder phases and both push buttons are pull-up GPIO inputs; the
//! ADXL345 accelerometer sits on I2C and is read in full-resolution ±2g mode.

use crate::config::PinConfig;
use crate::controller::input_source::{InputSource, PinId, Vector3};
use crate::error::{ReactorError, SensorError};
use rppal::gpio::{Gpio, InputPin};
use rppal::i2c::I2c;
use tracing::{debug, info};

const REG_DEVID: u8 = 0x00;
const REG_BW_RATE: u8 = 0x2C;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32;

const ADXL345_DEVICE_ID: u8 = 0xE5;
const POWER_CTL_MEASURE: u8 = 0x08;
const DATA_FORMAT_FULL_RES: u8 = 0x08;
const BW_RATE_100HZ: u8 = 0x0A;

/// 4 mg per LSB in full-resolution mode
const MS2_PER_LSB: f32 = 0.004 * 9.806_65;

pub struct Adxl345 {
    i2c: I2c,
}

impl Adxl345 {
    pub fn open(bus: u8, address: u16) -> Result<Self, ReactorError> {
        let mut i2c = I2c::with_bus(bus)
            .map_err(|e| ReactorError::Hardware(format!("Failed to open I2C bus {}: {}", bus, e)))?;
        i2c.set_slave_address(address).map_err(|e| {
            ReactorError::Hardware(format!("Failed to address 0x{:02X}: {}", address, e))
        })?;

        let device_id = i2c
            .smbus_read_byte(REG_DEVID)
            .map_err(|e| ReactorError::Hardware(format!("Failed to read ADXL345 id: {}", e)))?;
        if device_id != ADXL345_DEVICE_ID {
            return Err(ReactorError::Hardware(format!(
                "Unexpected accelerometer id 0x{:02X} (expected 0x{:02X})",
                device_id, ADXL345_DEVICE_ID
            )));
        }

        for (register, value) in [
            (REG_BW_RATE, BW_RATE_100HZ),
            (REG_DATA_FORMAT, DATA_FORMAT_FULL_RES),
            (REG_POWER_CTL, POWER_CTL_MEASURE),
        ] {
            i2c.smbus_write_byte(register, value).map_err(|e| {
                ReactorError::Hardware(format!(
                    "Failed to write ADXL345 register 0x{:02X}: {}",
                    register, e
                ))
            })?;
        }

        info!("ADXL345 ready on bus {} at 0x{:02X}", bus, address);
        Ok(Self { i2c })
    }

    pub fn read(&mut self) -> Result<Vector3, SensorError> {
        let mut raw = [0u8; 6];
        self.i2c
            .block_read(REG_DATAX0, &mut raw)
            .map_err(|e| SensorError::Acceleration(e.to_string()))?;

        let axis = |lo: usize| i16::from_le_bytes([raw[lo], raw[lo + 1]]) as f32 * MS2_PER_LSB;
        Ok(Vector3::new(axis(0), axis(2), axis(4)))
    }
}

/// [`InputSource`] backed by the Pi's GPIO header and I2C bus
pub struct GpioInput {
    encoder_a: InputPin,
    encoder_b: InputPin,
    encoder_switch: InputPin,
    action_button: InputPin,
    accelerometer: Adxl345,
}

impl GpioInput {
    pub fn open(pins: &PinConfig) -> Result<Self, ReactorError> {
        let gpio = Gpio::new()
            .map_err(|e| ReactorError::Hardware(format!("Failed to open GPIO: {}", e)))?;

        let input = |number: u8| -> Result<InputPin, ReactorError> {
            let pin = gpio.get(number).map_err(|e| {
                ReactorError::Hardware(format!("Failed to claim GPIO {}: {}", number, e))
            })?;
            debug!("GPIO {} configured as pull-up input", number);
            Ok(pin.into_input_pullup())
        };

        let source = Self {
            encoder_a: input(pins.encoder_a)?,
            encoder_b: input(pins.encoder_b)?,
            encoder_switch: input(pins.encoder_switch)?,
            action_button: input(pins.action_button)?,
            accelerometer: Adxl345::open(pins.i2c_bus, pins.accelerometer_address)?,
        };
        info!("Controller hardware initialised: {:?}", pins);
        Ok(source)
    }
}

impl InputSource for GpioInput {
    fn read_digital(&mut self, pin: PinId) -> Result<bool, SensorError> {
        let level = match pin {
            PinId::EncoderA => self.encoder_a.is_high(),
            PinId::EncoderB => self.encoder_b.is_high(),
            PinId::EncoderSwitch => self.encoder_switch.is_high(),
            PinId::ActionButton => self.action_button.is_high(),
        };
        Ok(level)
    }

    fn read_acceleration(&mut self) -> Result<Vector3, SensorError> {
        self.accelerometer.read()
    }
}
