use criterion::Criterion;
use hs1siv::hazmat::Implementation;

#[cfg(not(feature = "cpb"))]
pub type Benchmarker = Criterion;

#[cfg(feature = "cpb")]
pub type Benchmarker = Criterion<criterion_cycles_per_byte::CyclesPerByte>;

#[cfg(not(feature = "cpb"))]
pub fn config() -> Benchmarker {
    Criterion::default()
}

#[cfg(feature = "cpb")]
pub fn config() -> Benchmarker {
    Criterion::default().with_measurement(criterion_cycles_per_byte::CyclesPerByte)
}

/// Message sizes exercised by every benchmark.
pub const SIZES: &[usize] = &[16, 64, 256, 1024, 8192, 65536];

/// The reference implementation plus the accelerated one, if this CPU has it.
pub fn implementations() -> impl Iterator<Item = Implementation> {
    core::iter::once(Implementation::reference()).chain(Implementation::accelerated())
}
