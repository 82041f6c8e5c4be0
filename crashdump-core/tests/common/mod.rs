#![allow(dead_code)]

use core::cell::RefCell;
use core::fmt;
use core::time::Duration;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crashdump_core::config::{ArchProfile, BuildIdentity, HandlerConfig};
use crashdump_core::context::{FaultContext, GENERAL_REGISTERS, PC_INDEX, SP_INDEX};
use crashdump_core::dump::{MemorySource, WordSize};
use crashdump_core::platform::{
    Buttons, Clock, CodeMatrix, Color, Display, Extent, Input, Power, Storage, Surface,
};
use crashdump_core::region::RegionBounds;
use crashdump_core::timestamp::Timestamp;

pub const STACK_TOP: u32 = 0x2000_8000;
pub const STACK_LEN: u32 = 0x2000;
pub const CODE_START: u32 = 0x0800_0000;
pub const CODE_END: u32 = 0x0804_0000;

pub const BOUNDS: RegionBounds = RegionBounds::new(STACK_TOP, STACK_LEN, CODE_START, CODE_END);

pub const CONFIG: HandlerConfig = HandlerConfig::new(
    BOUNDS,
    ArchProfile::ARM9,
    BuildIdentity::new("crashdump", "v0.1.0"),
);

pub const STAMP: Timestamp = Timestamp::from_bcd(0x25, 0x03, 0x14, 0x15, 0x09, 0x26);

/// Memory where every byte holds the low byte of its own address.
pub struct AddressPattern;

impl MemorySource for AddressPattern {
    fn read(&self, address: u32, size: WordSize) -> u32 {
        (0..size.bytes()).fold(0, |word, offset| {
            word | ((address.wrapping_add(offset) & 0xFF) << (offset * 8))
        })
    }
}

pub fn context(sp: u32, pc: u32, status: u32) -> FaultContext {
    let mut general = [0u32; GENERAL_REGISTERS];
    general[SP_INDEX] = sp;
    general[PC_INDEX] = pc;
    FaultContext::from_parts(general, status)
}

/// Everything the mock collaborators did, in order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Clear(Surface),
    Text {
        surface: Surface,
        x: u32,
        y: u32,
        text: String,
    },
    Code {
        surface: Surface,
        size: u32,
    },
    Init(bool),
    Deinit,
    Write {
        path: String,
        len: usize,
        offset: u32,
        create: bool,
    },
    Poll(Option<Duration>),
    PowerOff,
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&mut self) -> Timestamp {
        self.0
    }
}

/// Character-cell display: one unit per column and per line.
pub struct MockDisplay {
    pub log: Log,
    pub size: Extent,
    /// Surface units per character cell, both ways.
    pub cell: u32,
}

impl Display for MockDisplay {
    fn clear(&mut self, surface: Surface, _color: Color) {
        self.log.borrow_mut().push(Event::Clear(surface));
    }

    fn draw_text(
        &mut self,
        surface: Surface,
        x: u32,
        y: u32,
        _foreground: Color,
        _background: Color,
        text: fmt::Arguments<'_>,
    ) {
        self.log.borrow_mut().push(Event::Text {
            surface,
            x,
            y,
            text: text.to_string(),
        });
    }

    fn measure_text(&self, text: &str) -> Extent {
        let width = text.lines().map(str::len).max().unwrap_or(0);
        let height = text.lines().count().max(1);
        let cells = |count: usize| u32::try_from(count).unwrap_or(u32::MAX).saturating_mul(self.cell);
        Extent::new(cells(width), cells(height))
    }

    fn surface_size(&self, _surface: Surface) -> Extent {
        self.size
    }

    fn draw_code<C>(&mut self, surface: Surface, code: &C)
    where
        C: CodeMatrix + ?Sized,
    {
        self.log.borrow_mut().push(Event::Code {
            surface,
            size: code.size(),
        });
    }
}

#[derive(Debug)]
pub struct Unavailable;

/// Storage whose `init` results are scripted; runs out into success.
pub struct MockStorage {
    pub log: Log,
    pub init_results: VecDeque<bool>,
    pub fail_writes: bool,
    pub written: Vec<u8>,
}

impl Storage for MockStorage {
    type Error = Unavailable;

    fn init(&mut self) -> Result<(), Unavailable> {
        let ok = self.init_results.pop_front().unwrap_or(true);
        self.log.borrow_mut().push(Event::Init(ok));
        if ok { Ok(()) } else { Err(Unavailable) }
    }

    fn deinit(&mut self) {
        self.log.borrow_mut().push(Event::Deinit);
    }

    fn write_file(
        &mut self,
        path: &str,
        data: &[u8],
        offset: u32,
        create: bool,
    ) -> Result<(), Unavailable> {
        self.log.borrow_mut().push(Event::Write {
            path: path.to_owned(),
            len: data.len(),
            offset,
            create,
        });
        if self.fail_writes {
            return Err(Unavailable);
        }
        self.written = data.to_vec();
        Ok(())
    }
}

/// Input returning scripted button sets; runs out into POWER.
pub struct MockInput {
    pub log: Log,
    pub presses: VecDeque<Buttons>,
}

impl Input for MockInput {
    fn poll(&mut self, timeout: Option<Duration>) -> Buttons {
        self.log.borrow_mut().push(Event::Poll(timeout));
        self.presses.pop_front().unwrap_or(Buttons::POWER)
    }
}

/// Unwind payload standing in for a powered-off device.
pub struct PoweredOff;

pub struct MockPower {
    pub log: Log,
}

impl Power for MockPower {
    fn power_off(&mut self) -> ! {
        self.log.borrow_mut().push(Event::PowerOff);
        panic::resume_unwind(Box::new(PoweredOff))
    }
}

/// Runs a diverging call and asserts it ended in a power-off.
pub fn expect_power_off<F>(run: F)
where
    F: FnOnce(),
{
    let payload = panic::catch_unwind(AssertUnwindSafe(run)).expect_err("must not return");
    assert!(
        payload.downcast_ref::<PoweredOff>().is_some(),
        "sequence should end in power_off"
    );
}
