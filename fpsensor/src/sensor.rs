//! High-level sensor interface

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, info, trace, warn};

use fpsensor_core::{
    constants::system_parameter, Instruction, Packet, PacketDecoder, PacketKind, Session, Status,
};
use fpsensor_transport::{SerialTransport, Transport};
use fpsensor_types::{
    template::{validate_page, validate_position, validate_range},
    BaudRate, CharBuffer, FingerprintImage, PacketSize, SecurityLevel, StorageUsage,
    SystemParameters, TemplateIndex, TemplateMatch,
};

use crate::config::SensorConfig;
use crate::error::{Error, Result};

/// A writable system parameter with a validated value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemParameter {
    BaudRate(BaudRate),
    SecurityLevel(SecurityLevel),
    PacketSize(PacketSize),
}

impl SystemParameter {
    /// Build from a raw parameter number and value
    pub fn from_raw(number: u8, value: u8) -> Result<Self> {
        let parameter = match number {
            system_parameter::BAUD_RATE => Self::BaudRate(BaudRate::from_code(value as u16)?),
            system_parameter::SECURITY_LEVEL => Self::SecurityLevel(SecurityLevel::new(value)?),
            system_parameter::PACKET_SIZE => Self::PacketSize(PacketSize::from_code(value as u16)?),
            _ => {
                return Err(fpsensor_types::Error::validation(format!(
                    "Invalid parameter number: {}",
                    number
                ))
                .into());
            }
        };
        Ok(parameter)
    }

    pub fn number(self) -> u8 {
        match self {
            Self::BaudRate(_) => system_parameter::BAUD_RATE,
            Self::SecurityLevel(_) => system_parameter::SECURITY_LEVEL,
            Self::PacketSize(_) => system_parameter::PACKET_SIZE,
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Self::BaudRate(rate) => rate.code(),
            Self::SecurityLevel(level) => level.level(),
            Self::PacketSize(size) => size.code(),
        }
    }
}

/// Decoded acknowledgment: confirmation code plus result bytes
#[derive(Debug)]
pub(crate) struct Ack {
    pub(crate) instruction: Instruction,
    pub(crate) status: Status,
    pub(crate) data: Bytes,
}

impl Ack {
    /// Result bytes, or the device error if the status is not Ok
    pub(crate) fn ok(self) -> Result<Bytes> {
        if self.status.is_ok() {
            Ok(self.data)
        } else {
            Err(self.error())
        }
    }

    pub(crate) fn error(&self) -> Error {
        fpsensor_core::Error::Device {
            instruction: self.instruction,
            status: self.status,
        }
        .into()
    }

    fn u16_at(&self, offset: usize) -> Result<u16> {
        self.data
            .get(offset..offset + 2)
            .map(BigEndian::read_u16)
            .ok_or_else(|| self.short_result())
    }

    fn u32_at(&self, offset: usize) -> Result<u32> {
        self.data
            .get(offset..offset + 4)
            .map(BigEndian::read_u32)
            .ok_or_else(|| self.short_result())
    }

    fn short_result(&self) -> Error {
        fpsensor_types::Error::parse(format!(
            "{} result too short: {} bytes",
            self.instruction.name(),
            self.data.len()
        ))
        .into()
    }
}

/// Fingerprint sensor
///
/// High-level interface for ZFM/R30x/R50x style sensors. One `Sensor` owns
/// its transport, its receive buffer and its session; every method takes
/// `&mut self`, so exactly one command is in flight at a time.
///
/// # Examples
///
/// ```no_run
/// use fpsensor::{CharBuffer, Sensor};
///
/// #[tokio::main]
/// async fn main() -> fpsensor::Result<()> {
///     let mut sensor = Sensor::serial("/dev/ttyUSB0", 57_600);
///
///     sensor.open().await?;
///
///     let usage = sensor.storage_usage().await?;
///     println!("Templates: {}", usage);
///
///     if sensor.read_image().await? {
///         sensor.convert_image(CharBuffer::One).await?;
///         println!("Match: {:?}", sensor.search_template(CharBuffer::One, 0, None).await?);
///     }
///
///     sensor.close().await?;
///     Ok(())
/// }
/// ```
pub struct Sensor<T = Box<dyn Transport>> {
    pub(crate) transport: T,
    pub(crate) decoder: PacketDecoder,
    pub(crate) session: Session,
    pub(crate) config: SensorConfig,
}

impl Sensor<SerialTransport> {
    /// Create a sensor on a serial port with the default configuration
    pub fn serial(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(
            SerialTransport::new(port_name).with_baud_rate(baud_rate),
            SensorConfig::default(),
        )
    }
}

impl<T: Transport> Sensor<T> {
    pub fn new(transport: T, config: SensorConfig) -> Self {
        Self {
            session: Session::new(config.address, config.password),
            transport,
            decoder: PacketDecoder::new(),
            config,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Check if the link is up and the password was verified
    pub fn is_open(&self) -> bool {
        self.session.is_verified() && self.transport.is_connected()
    }

    /// Connect and run the password handshake
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The transport cannot be opened
    /// - The sensor does not answer
    /// - The sensor rejects the password ([`Error::WrongPassword`])
    pub async fn open(&mut self) -> Result<()> {
        if self.session.is_verified() {
            return Err(fpsensor_core::Error::InvalidSessionState(
                "Sensor is already open".into(),
            )
            .into());
        }

        info!("Opening sensor on {}...", self.transport.remote_addr());

        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }

        if !self.verify_password().await? {
            warn!("The given fingerprint sensor password is wrong");
            if let Err(e) = self.transport.disconnect().await {
                warn!("Failed to close transport: {}", e);
            }
            return Err(Error::WrongPassword);
        }

        self.session.mark_verified()?;

        info!(
            "Sensor ready (address=0x{:08X})",
            self.session.address()
        );

        Ok(())
    }

    /// Disconnect and forget the handshake
    pub async fn close(&mut self) -> Result<()> {
        info!("Closing sensor on {}...", self.transport.remote_addr());

        self.transport.disconnect().await?;
        self.session.reset();
        self.decoder.clear();

        info!("Closed");
        Ok(())
    }

    // Session commands

    /// Check the session password against the sensor
    ///
    /// Returns `false` if the sensor reports a wrong password.
    pub async fn verify_password(&mut self) -> Result<bool> {
        let password = self.session.password();
        let ack = self
            .execute(Instruction::VerifyPassword, &password.to_be_bytes())
            .await?;

        match ack.status {
            Status::Ok => Ok(true),
            Status::WrongPassword => Ok(false),
            _ => Err(ack.error()),
        }
    }

    /// Change the sensor password
    ///
    /// The session keeps the old password unless the sensor acknowledges.
    pub async fn set_password(&mut self, password: u32) -> Result<()> {
        self.execute(Instruction::SetPassword, &password.to_be_bytes())
            .await?
            .ok()?;

        self.session.set_password(password);
        info!("Password changed");
        Ok(())
    }

    /// Change the sensor address
    ///
    /// Later frames carry the new address only after the sensor acknowledges.
    pub async fn set_address(&mut self, address: u32) -> Result<()> {
        self.execute(Instruction::SetAddress, &address.to_be_bytes())
            .await?
            .ok()?;

        self.session.set_address(address);
        info!("Address changed to 0x{:08X}", address);
        Ok(())
    }

    // System parameters

    pub async fn set_system_parameter(&mut self, parameter: SystemParameter) -> Result<()> {
        debug!("Setting system parameter {:?}", parameter);

        self.execute(
            Instruction::SetSystemParameter,
            &[parameter.number(), parameter.value()],
        )
        .await?
        .ok()?;

        Ok(())
    }

    /// Set the UART baud rate (a multiple of 9600, up to 115200)
    ///
    /// The sensor switches immediately; reopen the transport at the new rate.
    pub async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let rate = BaudRate::from_baud(baud_rate)?;
        self.set_system_parameter(SystemParameter::BaudRate(rate)).await?;

        warn!("Sensor now expects {} baud", rate.baud());
        Ok(())
    }

    pub async fn set_security_level(&mut self, level: u8) -> Result<()> {
        let level = SecurityLevel::new(level)?;
        self.set_system_parameter(SystemParameter::SecurityLevel(level))
            .await
    }

    /// Set the data packet size (32, 64, 128 or 256 bytes)
    pub async fn set_max_packet_size(&mut self, bytes: usize) -> Result<()> {
        let size = PacketSize::from_bytes(bytes)?;
        self.set_system_parameter(SystemParameter::PacketSize(size))
            .await
    }

    /// Fetch the system parameter block
    pub async fn system_parameters(&mut self) -> Result<SystemParameters> {
        let data = self
            .execute(Instruction::GetSystemParameters, &[])
            .await?
            .ok()?;

        let params = SystemParameters::from_payload(&data)?;
        debug!("System parameters: {}", params);
        Ok(params)
    }

    pub async fn storage_capacity(&mut self) -> Result<u16> {
        Ok(self.system_parameters().await?.storage_capacity)
    }

    pub async fn security_level(&mut self) -> Result<u16> {
        Ok(self.system_parameters().await?.security_level)
    }

    /// Current data packet size, queried from the sensor every time
    pub async fn max_packet_size(&mut self) -> Result<PacketSize> {
        Ok(self.system_parameters().await?.packet_size()?)
    }

    pub async fn baud_rate(&mut self) -> Result<u32> {
        Ok(self.system_parameters().await?.baud_rate())
    }

    // Template store

    /// Fetch the usage flags of one index page (0-3)
    pub async fn template_index(&mut self, page: u8) -> Result<TemplateIndex> {
        let page = validate_page(page)?;

        let data = self
            .execute(Instruction::TemplateIndex, &[page])
            .await?
            .ok()?;

        Ok(TemplateIndex::from_bitmap(page, &data)?)
    }

    /// Number of stored templates
    pub async fn template_count(&mut self) -> Result<u16> {
        let ack = self.execute(Instruction::TemplateCount, &[]).await?;
        let count = ack.u16_at(0);
        ack.ok()?;
        count
    }

    pub async fn storage_usage(&mut self) -> Result<StorageUsage> {
        let total = self.storage_capacity().await?;
        let used = self.template_count().await?;

        Ok(StorageUsage { used, total })
    }

    /// Store a char buffer as a template
    ///
    /// With `position = None` the first free slot is used. Returns the slot.
    pub async fn store_template(
        &mut self,
        position: Option<u16>,
        buffer: CharBuffer,
    ) -> Result<u16> {
        let capacity = self.storage_capacity().await?;

        let position = match position {
            Some(position) => validate_position(position, capacity)?,
            None => self.find_free_slot(capacity).await?,
        };

        let mut params = BytesMut::with_capacity(3);
        params.put_u8(buffer.into());
        params.put_u16(position);

        self.execute(Instruction::StoreTemplate, &params).await?.ok()?;

        info!("Stored {} at position {}", buffer, position);
        Ok(position)
    }

    /// Search the store for the characteristics in `buffer`
    ///
    /// `count = None` searches the whole store. Returns `None` when no
    /// template matches.
    pub async fn search_template(
        &mut self,
        buffer: CharBuffer,
        start: u16,
        count: Option<u16>,
    ) -> Result<Option<TemplateMatch>> {
        let count = match count {
            Some(count) if count > 0 => count,
            _ => self.storage_capacity().await?,
        };

        let mut params = BytesMut::with_capacity(5);
        params.put_u8(buffer.into());
        params.put_u16(start);
        params.put_u16(count);

        let ack = self.execute(Instruction::SearchTemplate, &params).await?;

        match ack.status {
            Status::Ok => {
                let found = TemplateMatch {
                    position: ack.u16_at(0)?,
                    score: ack.u16_at(2)?,
                };
                debug!("Search hit {}", found);
                Ok(Some(found))
            }
            Status::NoTemplateFound => {
                debug!("Search found no template");
                Ok(None)
            }
            _ => Err(ack.error()),
        }
    }

    /// Load the template at `position` into `buffer`
    pub async fn load_template(&mut self, position: u16, buffer: CharBuffer) -> Result<()> {
        let capacity = self.storage_capacity().await?;
        let position = validate_position(position, capacity)?;

        let mut params = BytesMut::with_capacity(3);
        params.put_u8(buffer.into());
        params.put_u16(position);

        self.execute(Instruction::LoadTemplate, &params).await?.ok()?;
        Ok(())
    }

    /// Delete `count` templates starting at `position`
    ///
    /// Returns `false` if the sensor could not delete them.
    pub async fn delete_template(&mut self, position: u16, count: u16) -> Result<bool> {
        let capacity = self.storage_capacity().await?;
        validate_range(position, count, capacity)?;

        let mut params = BytesMut::with_capacity(4);
        params.put_u16(position);
        params.put_u16(count);

        let ack = self.execute(Instruction::DeleteTemplate, &params).await?;

        match ack.status {
            Status::Ok => {
                info!("Deleted {} template(s) from position {}", count, position);
                Ok(true)
            }
            Status::DeleteFailed => Ok(false),
            _ => Err(ack.error()),
        }
    }

    /// Delete every template. Returns `false` if the sensor refused.
    pub async fn clear_database(&mut self) -> Result<bool> {
        let ack = self.execute(Instruction::ClearDatabase, &[]).await?;

        match ack.status {
            Status::Ok => {
                info!("Template store cleared");
                Ok(true)
            }
            Status::ClearFailed => Ok(false),
            _ => Err(ack.error()),
        }
    }

    // Image and characteristics

    /// Capture an image into the image buffer
    ///
    /// Returns `false` if no finger is on the sensor.
    pub async fn read_image(&mut self) -> Result<bool> {
        let ack = self.execute(Instruction::ReadImage, &[]).await?;

        match ack.status {
            Status::Ok => Ok(true),
            Status::NoFinger => Ok(false),
            _ => Err(ack.error()),
        }
    }

    /// Transfer the image buffer to the host
    pub async fn download_image(&mut self) -> Result<FingerprintImage> {
        self.execute(Instruction::DownloadImage, &[]).await?.ok()?;

        let data = self.receive_data().await?;
        Ok(FingerprintImage::from_raw(data.freeze())?)
    }

    /// Extract characteristics from the image buffer into `buffer`
    pub async fn convert_image(&mut self, buffer: CharBuffer) -> Result<()> {
        self.execute(Instruction::ConvertImage, &[buffer.into()])
            .await?
            .ok()?;
        Ok(())
    }

    /// Combine both char buffers into one template
    ///
    /// Returns `false` if the characteristics do not belong together.
    pub async fn create_template(&mut self) -> Result<bool> {
        let ack = self.execute(Instruction::CreateTemplate, &[]).await?;

        match ack.status {
            Status::Ok => Ok(true),
            Status::CharacteristicsMismatch => Ok(false),
            _ => Err(ack.error()),
        }
    }

    /// Compare char buffer 1 with char buffer 2
    ///
    /// Returns the match score, 0 when they do not match.
    pub async fn compare_characteristics(&mut self) -> Result<u16> {
        let ack = self.execute(Instruction::CompareCharacteristics, &[]).await?;

        match ack.status {
            Status::Ok => ack.u16_at(0),
            Status::NotMatching => Ok(0),
            _ => Err(ack.error()),
        }
    }

    /// Write characteristics into `buffer` and read them back
    ///
    /// # Errors
    ///
    /// [`Error::UploadMismatch`] if the sensor's copy differs from `data`.
    pub async fn upload_characteristics(&mut self, data: &[u8], buffer: CharBuffer) -> Result<()> {
        if data.is_empty() {
            return Err(
                fpsensor_types::Error::validation("The characteristics data is required").into(),
            );
        }

        let packet_size = self.max_packet_size().await?;

        self.execute(Instruction::UploadCharacteristics, &[buffer.into()])
            .await?
            .ok()?;

        self.send_data(data, packet_size.bytes()).await?;

        let stored = self.download_characteristics(buffer).await?;
        if stored.as_ref() != data {
            warn!(
                "Uploaded {} bytes to {} but read back {} different bytes",
                data.len(),
                buffer,
                stored.len()
            );
            return Err(Error::UploadMismatch {
                sent: data.len(),
                received: stored.len(),
            });
        }

        info!("Uploaded {} bytes to {}", data.len(), buffer);
        Ok(())
    }

    /// Read the characteristics held in `buffer`
    pub async fn download_characteristics(&mut self, buffer: CharBuffer) -> Result<Bytes> {
        self.execute(Instruction::DownloadCharacteristics, &[buffer.into()])
            .await?
            .ok()?;

        Ok(self.receive_data().await?.freeze())
    }

    pub async fn generate_random_number(&mut self) -> Result<u32> {
        let ack = self.execute(Instruction::GenerateRandomNumber, &[]).await?;
        let number = ack.u32_at(0);
        ack.ok()?;
        number
    }

    // Helper methods

    /// Send one command and decode its acknowledgment
    pub(crate) async fn execute(&mut self, instruction: Instruction, params: &[u8]) -> Result<Ack> {
        if instruction != Instruction::VerifyPassword {
            self.session.ensure_verified()?;
        }

        debug!("Executing {}", instruction);

        let packet = Packet::command(instruction, params);
        self.send_packet(&packet).await?;

        let response = self.receive_packet().await?;
        response.expect_kind(PacketKind::Ack)?;

        let status = response.status().ok_or_else(|| {
            Error::InvalidResponse(format!("{} acknowledgment carries no status", instruction))
        })?;

        if !status.is_ok() {
            debug!("{} answered {}", instruction, status);
        }

        Ok(Ack {
            instruction,
            status,
            data: response.payload.slice(1..),
        })
    }

    pub(crate) async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        if packet.payload.len() > Packet::MAX_PAYLOAD_SIZE {
            return Err(fpsensor_core::Error::PayloadTooLarge {
                size: packet.payload.len(),
                max: Packet::MAX_PAYLOAD_SIZE,
            }
            .into());
        }

        trace!("Sending: {:?}", packet);

        let data = packet.encode(self.session.address());
        self.transport.send(&data).await?;

        Ok(())
    }

    pub(crate) async fn receive_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = self.decoder.next_packet()? {
                trace!("Received: {:?}", packet);
                return Ok(packet);
            }

            match self.transport.receive(self.config.read_timeout).await {
                Ok(chunk) => self.decoder.push(&chunk),
                Err(e) => {
                    self.decoder.clear();
                    return Err(e.into());
                }
            }
        }
    }
}
