mod common;

use common::{AddressPattern, BOUNDS, CODE_END, CODE_START, CONFIG, STACK_LEN, STACK_TOP, STAMP, context};
use crashdump_core::dump::{HexDump, WordSize};
use crashdump_core::kind::ExceptionVector;
use crashdump_core::region::{CODE_DUMP_RADIUS, ROW_BYTES, STACK_DUMP_LEN};
use crashdump_core::report::{ReportComposer, Snapshot};
use crashdump_core::writer::Report;

const SIZES: [WordSize; 3] = [WordSize::Byte, WordSize::Half, WordSize::Word];

fn sample_addresses(around: &[u32]) -> Vec<u32> {
    let mut addresses = vec![0, 1, u32::MAX, u32::MAX - 0xF];
    for &base in around {
        for delta in [0u32, 1, 4, 0xF, 0x10, 0x11, 0x7F, 0x80, 0x81] {
            addresses.push(base.wrapping_add(delta));
            addresses.push(base.wrapping_sub(delta));
        }
    }
    addresses
}

#[test]
fn stack_window_exists_only_inside_stack_region() {
    let bottom = STACK_TOP - STACK_LEN;
    for sp in sample_addresses(&[bottom, STACK_TOP, bottom + STACK_LEN / 2]) {
        let aligned = sp & !(ROW_BYTES - 1);
        let inside = bottom <= aligned && aligned < STACK_TOP;
        let window = BOUNDS.stack_window(sp);
        assert_eq!(window.is_some(), inside, "sp {sp:#010X}");

        if let Some(window) = window {
            assert!(window.upper() <= STACK_TOP);
            assert!(window.len() <= STACK_DUMP_LEN);
            assert_eq!(window.lower(), aligned);
        }
    }
}

#[test]
fn code_window_is_clamped_to_code_image() {
    for pc in sample_addresses(&[CODE_START, CODE_END, CODE_START + 0x1000]) {
        let aligned = pc & !(ROW_BYTES - 1);
        let inside = CODE_START <= aligned && aligned < CODE_END;
        let window = BOUNDS.code_window(pc);
        assert_eq!(window.is_some(), inside, "pc {pc:#010X}");

        if let Some(window) = window {
            assert!(window.lower() >= CODE_START);
            assert!(window.upper() <= CODE_END);
            if aligned - CODE_START >= CODE_DUMP_RADIUS && CODE_END - aligned >= CODE_DUMP_RADIUS {
                assert_eq!(window.lower(), aligned - CODE_DUMP_RADIUS);
                assert_eq!(window.upper(), aligned + CODE_DUMP_RADIUS);
            }
        }
    }
}

#[test]
fn row_count_matches_window_length_for_every_word_size() {
    let window = BOUNDS.stack_window(STACK_TOP - STACK_DUMP_LEN).expect("window");
    for size in SIZES {
        let dump = HexDump::new(window, size);
        let mut text = String::new();
        dump.write_to(&mut text, &AddressPattern).expect("string write");

        assert_eq!(dump.rows(), (window.len() / ROW_BYTES) as usize);
        assert_eq!(text.lines().count(), dump.rows());
        assert_eq!(text.len(), dump.rendered_len());
    }
}

#[test]
fn dumping_the_same_window_twice_is_identical() {
    let window = BOUNDS.code_window(CODE_START + 0x400).expect("window");
    for size in SIZES {
        let dump = HexDump::new(window, size);
        let mut first = String::new();
        let mut second = String::new();
        dump.write_to(&mut first, &AddressPattern).expect("write");
        dump.write_to(&mut second, &AddressPattern).expect("write");
        assert_eq!(first, second);
    }
}

#[test]
fn byte_rows_show_memory_in_address_order() {
    let window = BOUNDS.stack_window(STACK_TOP - 0x10).expect("window");
    let mut text = String::new();
    HexDump::new(window, WordSize::Byte)
        .write_to(&mut text, &AddressPattern)
        .expect("write");
    assert_eq!(
        text,
        "20007FF0: F0 F1 F2 F3 F4 F5 F6 F7 F8 F9 FA FB FC FD FE FF \n"
    );
}

#[test]
fn composed_report_never_exceeds_capacity() {
    let cases = [
        (0, 0),
        (STACK_TOP - 0x40, 0),
        (0, CODE_START + 0x100),
        (STACK_TOP - STACK_DUMP_LEN, CODE_START + 0x100),
    ];
    for (sp, pc) in cases {
        let snapshot = Snapshot::capture(&CONFIG, ExceptionVector(4), context(sp, pc, 0), STAMP);
        let composer = ReportComposer::from_config(&CONFIG);

        let small: Report<400> = composer.compose(&snapshot, &AddressPattern);
        let medium: Report<900> = composer.compose(&snapshot, &AddressPattern);
        let full: Report = composer.compose(&snapshot, &AddressPattern);

        assert!(small.len() <= small.capacity());
        assert!(medium.len() <= medium.capacity());
        assert!(full.len() <= full.capacity());
        assert!(!full.is_truncated(), "default capacity fits both sections");
        assert!(full.as_str().ends_with('\n'));
        assert!(medium.as_str().starts_with(small.summary()));
    }
}
