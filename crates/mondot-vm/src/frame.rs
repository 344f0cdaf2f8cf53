use mondot_core::{Function, Value};

/// Per-call execution record: the local slot array and the shared
/// stack's floor at entry. Created on each call, released on return.
#[derive(Debug)]
pub struct Frame {
    locals: Vec<Value>,
    floor: usize,
}

impl Frame {
    /// Build a frame for `func`, binding `args` to the declared
    /// parameter slots. Slot 0 is the scratch temporary, so argument
    /// `j` lands in slot `1 + j`; surplus arguments are dropped and
    /// missing ones leave their slots nil.
    pub fn new(func: &Function, args: &[Value], floor: usize) -> Self {
        let mut locals = vec![Value::Nil; func.locals.len()];
        let bound = args.len().min(func.params);
        for (j, arg) in args.iter().take(bound).enumerate() {
            if let Some(dst) = locals.get_mut(1 + j) {
                *dst = arg.clone();
            }
        }
        Self { locals, floor }
    }

    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn local(&self, slot: usize) -> Option<&Value> {
        self.locals.get(slot)
    }

    /// Store into a slot; false when the slot is out of range.
    pub fn set_local(&mut self, slot: usize, value: Value) -> bool {
        match self.locals.get_mut(slot) {
            Some(dst) => {
                *dst = value;
                true
            }
            None => false,
        }
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }
}
