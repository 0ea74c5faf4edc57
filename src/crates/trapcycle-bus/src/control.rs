//! Parameters that are either fixed or read live each tick

use std::fmt;
use std::sync::Arc;

/// A number read once per tick
///
/// `Dynamic` wraps any source of the current value (a knob, an automation
/// lane, another chain's state) as a closure.
#[derive(Clone)]
pub enum Control {
    Static(f64),
    Dynamic(Arc<dyn Fn() -> f64 + Send + Sync>),
}

impl Control {
    pub fn dynamic<F>(read: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Control::Dynamic(Arc::new(read))
    }

    /// Current value
    pub fn value(&self) -> f64 {
        match self {
            Control::Static(v) => *v,
            Control::Dynamic(read) => read(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Control::Dynamic(_))
    }
}

impl Default for Control {
    fn default() -> Self {
        Control::Static(0.0)
    }
}

impl From<f64> for Control {
    fn from(v: f64) -> Self {
        Control::Static(v)
    }
}

impl From<i32> for Control {
    fn from(v: i32) -> Self {
        Control::Static(v as f64)
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Static(v) => write!(f, "Static({})", v),
            Control::Dynamic(read) => write!(f, "Dynamic({})", read()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_static_control() {
        let c = Control::from(4.0);
        assert_eq!(c.value(), 4.0);
        assert!(!c.is_dynamic());
    }

    #[test]
    fn test_dynamic_control_reads_live() {
        let knob = Arc::new(AtomicU64::new(2.0f64.to_bits()));
        let source = Arc::clone(&knob);
        let c = Control::dynamic(move || f64::from_bits(source.load(Ordering::Relaxed)));

        assert_eq!(c.value(), 2.0);
        knob.store(8.0f64.to_bits(), Ordering::Relaxed);
        assert_eq!(c.value(), 8.0);
        assert!(c.is_dynamic());
    }
}
