//! Dump store on the last pages of internal flash.
//!
//! Boards without removable media keep the newest report here. A record is
//! a 16-byte header followed by the path and the report text, each padded to
//! the flash write granularity:
//!
//! | offset | field                         |
//! |--------|-------------------------------|
//! | 0      | magic `CDMP`                  |
//! | 4      | path length (u16 LE)          |
//! | 6      | reserved (0xFFFF)             |
//! | 8      | report length (u32 LE)        |
//! | 12     | reserved (0xFFFF_FFFF)        |

use crashdump_core::platform::Storage;
use defmt::{debug, warn};
use embassy_stm32::Peripherals;
use embassy_stm32::flash::{self, Blocking, FLASH_SIZE, Flash, WRITE_SIZE};

/// Erase page size on STM32G0B1.
pub const PAGE_SIZE: u32 = 2048;
pub const STORE_PAGES: u32 = 2;
pub const STORE_LEN: u32 = PAGE_SIZE * STORE_PAGES;
/// Offset of the store from the start of flash.
pub const STORE_OFFSET: u32 = FLASH_SIZE as u32 - STORE_LEN;

const MAGIC: [u8; 4] = *b"CDMP";
const HEADER_LEN: u32 = 16;

#[derive(Debug)]
pub enum StoreError {
    Flash(flash::Error),
    NotMounted,
    /// Only whole-record writes from offset zero are supported.
    Unsupported,
    TooLarge,
}

/// Buffers bytes into write-granularity chunks.
struct ChunkWriter<'a, 'd> {
    flash: &'a mut Flash<'d, Blocking>,
    offset: u32,
    chunk: [u8; WRITE_SIZE],
    filled: usize,
}

impl<'a, 'd> ChunkWriter<'a, 'd> {
    fn new(flash: &'a mut Flash<'d, Blocking>, offset: u32) -> Self {
        Self {
            flash,
            offset,
            chunk: [0xFF; WRITE_SIZE],
            filled: 0,
        }
    }

    fn write(&mut self, mut data: &[u8]) -> Result<(), flash::Error> {
        while !data.is_empty() {
            let take = (WRITE_SIZE - self.filled).min(data.len());
            self.chunk[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
            if self.filled == WRITE_SIZE {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Writes out a partial chunk padded with erased bytes.
    fn flush(&mut self) -> Result<(), flash::Error> {
        if self.filled == 0 {
            return Ok(());
        }
        self.chunk[self.filled..].fill(0xFF);
        self.flash.blocking_write(self.offset, &self.chunk)?;
        self.offset += WRITE_SIZE as u32;
        self.filled = 0;
        Ok(())
    }
}

const fn padded(len: u32) -> u32 {
    len.div_ceil(WRITE_SIZE as u32) * WRITE_SIZE as u32
}

pub struct FlashStore {
    flash: Flash<'static, Blocking>,
    mounted: bool,
}

impl FlashStore {
    /// # Safety
    ///
    /// The flash controller must not be in use elsewhere; the fault path is
    /// the only caller and the application is never resumed.
    pub unsafe fn steal() -> Self {
        let p = unsafe { Peripherals::steal() };
        Self {
            flash: Flash::new_blocking(p.FLASH),
            mounted: false,
        }
    }
}

impl Storage for FlashStore {
    type Error = StoreError;

    /// Erases the store so a fresh record can be written.
    fn init(&mut self) -> Result<(), StoreError> {
        self.flash
            .blocking_erase(STORE_OFFSET, STORE_OFFSET + STORE_LEN)
            .map_err(StoreError::Flash)?;
        self.mounted = true;
        debug!("crash: dump store erased at {=u32:#x}", STORE_OFFSET);
        Ok(())
    }

    fn deinit(&mut self) {
        self.mounted = false;
    }

    fn write_file(&mut self, path: &str, data: &[u8], offset: u32, _create: bool) -> Result<(), StoreError> {
        if !self.mounted {
            return Err(StoreError::NotMounted);
        }
        if offset != 0 {
            return Err(StoreError::Unsupported);
        }
        let path_len = u16::try_from(path.len()).map_err(|_| StoreError::TooLarge)?;
        let data_len = u32::try_from(data.len()).map_err(|_| StoreError::TooLarge)?;
        if HEADER_LEN + padded(u32::from(path_len)) + padded(data_len) > STORE_LEN {
            warn!("crash: report of {=u32} bytes exceeds the dump store", data_len);
            return Err(StoreError::TooLarge);
        }

        let mut header = [0xFF; HEADER_LEN as usize];
        header[..4].copy_from_slice(&MAGIC);
        header[4..6].copy_from_slice(&path_len.to_le_bytes());
        header[8..12].copy_from_slice(&data_len.to_le_bytes());

        let mut writer = ChunkWriter::new(&mut self.flash, STORE_OFFSET);
        writer.write(&header).map_err(StoreError::Flash)?;
        writer.write(path.as_bytes()).map_err(StoreError::Flash)?;
        writer.flush().map_err(StoreError::Flash)?;
        writer.write(data).map_err(StoreError::Flash)?;
        writer.flush().map_err(StoreError::Flash)
    }
}
