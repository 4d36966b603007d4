// ReflexPod — System Events

// ---------------------------------------------------------------------------
// Link events — produced by the transport context, drained by the control loop
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A peer attached.
    Attached,
    /// The peer went away.
    Detached,
    /// One inbound command payload, undecoded.
    Payload(String),
}

// ---------------------------------------------------------------------------
// Power events — returned by the device tick
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    /// Idle past the inactivity timeout.
    InactivitySleep,
}
