//! Exception entry points.
//!
//! ARMv6-M folds every synchronous fault into HardFault, which is reported
//! with the data-abort code. Unexpected interrupts land in the default
//! handler and are reported as IRQs.

use cortex_m::{asm, interrupt};
use cortex_m_rt::{ExceptionFrame, exception};
use crashdump_core::context::{
    FaultContext, GENERAL_REGISTERS, LR_INDEX, PC_INDEX, REGISTER_COUNT, SP_INDEX,
};
use crashdump_core::kind::{ExceptionKind, ExceptionVector};
use crashdump_core::platform::Clock;
use crashdump_core::timestamp::Timestamp;
use defmt::error;
use portable_atomic::{AtomicBool, Ordering};

use crate::crash;
use crate::hw::rtc::RtcClock;

/// Set on the first fault; a fault taken while handling halts instead.
static HANDLING: AtomicBool = AtomicBool::new(false);

/// xPSR bit set when the core padded the stack to 8-byte alignment on entry.
const XPSR_STACK_ALIGN: u32 = 1 << 9;

/// Bytes the core pushes on exception entry (R0-R3, R12, LR, PC, xPSR).
const FRAME_LEN: u32 = 8 * 4;

/// Rebuilds the register bank from the hardware-stacked frame.
///
/// R4-R11 are not stacked by the core and are reported as zero.
fn context_from_frame(frame: &ExceptionFrame) -> FaultContext {
    let frame_base = core::ptr::from_ref(frame) as u32;
    let padding = if frame.xpsr() & XPSR_STACK_ALIGN != 0 { 4 } else { 0 };

    let mut general = [0u32; GENERAL_REGISTERS];
    general[0] = frame.r0();
    general[1] = frame.r1();
    general[2] = frame.r2();
    general[3] = frame.r3();
    general[12] = frame.r12();
    general[SP_INDEX] = frame_base + FRAME_LEN + padding;
    general[LR_INDEX] = frame.lr();
    general[PC_INDEX] = frame.pc();
    FaultContext::from_parts(general, frame.xpsr())
}

fn enter(vector: ExceptionVector, context: FaultContext, timestamp: Timestamp) -> ! {
    interrupt::disable();
    if HANDLING.swap(true, Ordering::AcqRel) {
        error!("crash: nested {} while handling a fault", vector.kind());
        loop {
            asm::wfi();
        }
    }
    crash::run(vector, context, timestamp)
}

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    let context = context_from_frame(frame);
    let timestamp = RtcClock.now();
    enter(ExceptionKind::DataAbort.into(), context, timestamp)
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) -> ! {
    let timestamp = RtcClock.now();
    error!("crash: unhandled interrupt {=i16}", irqn);
    enter(
        ExceptionKind::Irq.into(),
        FaultContext::new([0; REGISTER_COUNT]),
        timestamp,
    )
}

/// Executes a permanently undefined instruction, for exercising the handler.
pub fn trigger_test_fault() -> ! {
    asm::udf()
}
