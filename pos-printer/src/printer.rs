//! Printer capability contract and the raw TCP adapter
//!
//! Supports:
//! - Any device implementing [`Printer`] (serial, USB, test doubles)
//! - Network printers (TCP port 9100)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::driver::{EpsonDriver, StatusDriver, StatusRequest};
use crate::error::{PrintError, PrintResult};
use crate::escpos::to_escpos;
use crate::instruction::InstructionStream;
use crate::status::{NOT_OPEN, PrinterStatus};

/// Trait for printer adapters
///
/// All device operations are async; a status fetch and a print may be issued
/// from different tasks, so implementations must be `Send + Sync`.
#[async_trait]
pub trait Printer: Send + Sync {
    /// Display name, unique within a fleet
    fn name(&self) -> &str;

    /// Paper width in characters
    fn width(&self) -> usize;

    fn is_open(&self) -> bool;

    async fn open(&self) -> PrintResult<()>;

    async fn close(&self) -> PrintResult<()>;

    /// Query the device's live status
    async fn status(&self) -> PrintResult<PrinterStatus>;

    /// Send a compiled job to the device
    async fn execute(&self, printing: InstructionStream) -> PrintResult<()>;

    /// Status decoder for this device family
    fn driver(&self) -> &dyn StatusDriver;

    /// Fresh instruction stream sized for this printer
    fn create_printing(&self) -> InstructionStream {
        InstructionStream::new(self.width())
    }
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100. The
/// connection is held open between `open` and `close` so status polling does
/// not reconnect on every tick.
#[derive(Debug)]
pub struct NetworkPrinter {
    name: String,
    addr: SocketAddr,
    width: usize,
    timeout: Duration,
    driver: EpsonDriver,
    open: AtomicBool,
    stream: Mutex<Option<TcpStream>>,
}

impl NetworkPrinter {
    /// Create a new network printer
    ///
    /// Default port is 9100 if not specified in address.
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        Self::from_addr(&format!("{}:{}", host, port))
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            name: addr.to_string(),
            addr,
            width: 42,
            timeout: Duration::from_secs(5),
            driver: EpsonDriver,
            open: AtomicBool::new(false),
            stream: Mutex::new(None),
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set paper width in characters
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn not_open(&self) -> PrintError {
        PrintError::NotOpen(self.name.clone())
    }
}

#[async_trait]
impl Printer for NetworkPrinter {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> usize {
        self.width
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&self) -> PrintResult<()> {
        info!("Connecting to printer");

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        *self.stream.lock().await = Some(stream);
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn close(&self) -> PrintResult<()> {
        self.open.store(false, Ordering::Release);
        if let Some(mut stream) = self.stream.lock().await.take() {
            stream.shutdown().await?;
            info!("Connection closed");
        }
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn status(&self) -> PrintResult<PrinterStatus> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or_else(|| self.not_open())?;

        let mut status = PrinterStatus::new();
        status.set_flag(NOT_OPEN, false);

        for request in StatusRequest::ALL {
            stream.write_all(&request.command()).await?;
            let mut byte = [0u8; 1];
            let read = tokio::time::timeout(self.timeout, stream.read(&mut byte))
                .await
                .map_err(|_| PrintError::Timeout(format!("Status timeout: {}", self.addr)))??;
            if read == 0 {
                warn!("Printer closed the connection");
                return Err(PrintError::Offline(self.name.clone()));
            }
            status.merge(self.driver.decode(request, &byte));
        }

        Ok(status)
    }

    #[instrument(skip(self, printing), fields(addr = %self.addr))]
    async fn execute(&self, printing: InstructionStream) -> PrintResult<()> {
        let data = to_escpos(&printing);
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or_else(|| self.not_open())?;

        info!("Sending {} bytes", data.len());

        stream.write_all(&data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;

        stream.flush().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    fn driver(&self) -> &dyn StatusDriver {
        &self.driver
    }
}
