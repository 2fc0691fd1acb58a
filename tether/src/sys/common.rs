/// Readiness a caller is interested in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Interest {
    pub(crate) read: bool,
    pub(crate) write: bool,
}

impl Interest {
    pub(crate) const READ: Interest = Interest {
        read: true,
        write: false,
    };

    pub(crate) const WRITE: Interest = Interest {
        read: false,
        write: true,
    };
}

/// Readiness reported by a single-descriptor poll.
///
/// `hangup` and `error` are reported by the OS regardless of interest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Readiness {
    pub(crate) readable: bool,
    pub(crate) writable: bool,
    pub(crate) hangup: bool,
    pub(crate) error: bool,
    pub(crate) invalid: bool,
}

impl Readiness {
    /// Whether a receive would return without blocking, either with
    /// data, an end-of-stream, or a pending error.
    pub(crate) fn can_receive(&self) -> bool {
        self.readable || self.hangup || self.error
    }
}
