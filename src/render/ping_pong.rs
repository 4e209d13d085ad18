/// Two buffers whose read/write roles alternate.
///
/// `read` always holds the last committed value; `write` is the scratch target of the next
/// pass. The two are distinct slots, so a pass can never read what it is writing.
#[derive(Clone, Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    read: usize,
}

impl<T> PingPong<T> {
    pub fn new(read: T, write: T) -> Self {
        Self {
            slots: [read, write],
            read: 0,
        }
    }

    pub fn read(&self) -> &T {
        &self.slots[self.read]
    }

    pub fn write(&mut self) -> &mut T {
        &mut self.slots[1 - self.read]
    }

    /// Borrow both roles at once: `(read, write)`.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.read == 0 { (&*a, b) } else { (&*b, a) }
    }

    /// Commit the write slot. Call once per successful pass.
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    pub fn read_index(&self) -> usize {
        self.read
    }
}
