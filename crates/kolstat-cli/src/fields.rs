//! The `fields` command: list selectable performance-variant labels.

use kolstat_core::PerfVariant;

pub(crate) fn print_labels() {
    for variant in PerfVariant::ALL {
        println!("{}", variant.label());
    }
}
