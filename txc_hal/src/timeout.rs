//! Stall guard for drivers that may block.
//!
//! `TimeoutDevice` moves the wrapped device onto a dedicated worker thread
//! and forwards every call over a channel. A call that does not answer
//! within the budget returns `DeviceError::Timeout`; the loop driver counts
//! that as an overrun instead of hanging. Calls are tagged with a sequence
//! id so the late reply of a timed-out call is discarded, never mistaken
//! for the answer to a newer call.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use txc_common::device::{ChannelId, DeviceError, DeviceIo};

#[derive(Debug, Clone, Copy)]
enum Request {
    ReadSensor(ChannelId),
    ReadSwitch(ChannelId),
    SetMotor(i32, i32),
    SetOutput(ChannelId, bool),
    SetSpeed(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Level(bool),
    Done,
}

type Tagged<T> = (u64, T);

/// Device proxy enforcing a per-call time budget.
#[derive(Debug)]
pub struct TimeoutDevice {
    name: &'static str,
    outputs: usize,
    requests: Sender<Tagged<Request>>,
    replies: Receiver<Tagged<Result<Reply, DeviceError>>>,
    timeout: Duration,
    seq: u64,
    timeouts: u64,
}

impl TimeoutDevice {
    /// Move `device` onto a worker thread and guard its calls with `timeout`.
    ///
    /// # Errors
    /// Returns `DeviceError::Unavailable` if the worker thread cannot be spawned.
    pub fn spawn<D>(device: D, timeout: Duration) -> Result<Self, DeviceError>
    where
        D: DeviceIo + Send + 'static,
    {
        let name = device.name();
        let outputs = device.output_channels();
        let (req_tx, req_rx) = mpsc::channel::<Tagged<Request>>();
        let (rep_tx, rep_rx) = mpsc::channel();

        thread::Builder::new()
            .name(format!("txc-dev-{name}"))
            .spawn(move || serve(device, req_rx, rep_tx))
            .map_err(|e| DeviceError::Unavailable(format!("device worker: {e}")))?;

        debug!("Stall guard started for '{name}' (budget {timeout:?})");
        Ok(Self {
            name,
            outputs,
            requests: req_tx,
            replies: rep_rx,
            timeout,
            seq: 0,
            timeouts: 0,
        })
    }

    /// Per-call budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of calls that exceeded the budget so far.
    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    fn call(&mut self, op: &'static str, request: Request) -> Result<Reply, DeviceError> {
        self.seq += 1;
        let id = self.seq;
        self.requests
            .send((id, request))
            .map_err(|_| DeviceError::Unavailable(format!("{} worker stopped", self.name)))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok((reply_id, reply)) if reply_id == id => return reply,
                Ok((stale, _)) => debug!("Discarding late reply #{stale} from '{}'", self.name),
                Err(RecvTimeoutError::Timeout) => {
                    self.timeouts += 1;
                    warn!("'{}' {op} stalled beyond {:?}", self.name, self.timeout);
                    return Err(DeviceError::Timeout {
                        op,
                        after: self.timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(DeviceError::Unavailable(format!(
                        "{} worker stopped",
                        self.name
                    )));
                }
            }
        }
    }

    fn level(&mut self, op: &'static str, request: Request) -> Result<bool, DeviceError> {
        match self.call(op, request)? {
            Reply::Level(level) => Ok(level),
            Reply::Done => Err(DeviceError::Communication(format!("{op}: unexpected reply"))),
        }
    }

    fn done(&mut self, op: &'static str, request: Request) -> Result<(), DeviceError> {
        self.call(op, request).map(|_| ())
    }
}

/// Worker loop: runs until the proxy is dropped.
fn serve<D: DeviceIo>(
    mut device: D,
    requests: Receiver<Tagged<Request>>,
    replies: Sender<Tagged<Result<Reply, DeviceError>>>,
) {
    while let Ok((id, request)) = requests.recv() {
        let reply = match request {
            Request::ReadSensor(ch) => device.read_sensor(ch).map(Reply::Level),
            Request::ReadSwitch(ch) => device.read_switch(ch).map(Reply::Level),
            Request::SetMotor(l, r) => device.set_motor(l, r).map(|_| Reply::Done),
            Request::SetOutput(ch, v) => device.set_digital_output(ch, v).map(|_| Reply::Done),
            Request::SetSpeed(v) => device.set_speed(v).map(|_| Reply::Done),
        };
        if replies.send((id, reply)).is_err() {
            break;
        }
    }
}

impl DeviceIo for TimeoutDevice {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read_sensor(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        self.level("read_sensor", Request::ReadSensor(channel))
    }

    fn read_switch(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        self.level("read_switch", Request::ReadSwitch(channel))
    }

    fn set_motor(&mut self, left_duty: i32, right_duty: i32) -> Result<(), DeviceError> {
        self.done("set_motor", Request::SetMotor(left_duty, right_duty))
    }

    fn set_digital_output(&mut self, channel: ChannelId, value: bool) -> Result<(), DeviceError> {
        self.done("set_digital_output", Request::SetOutput(channel, value))
    }

    fn set_speed(&mut self, value: i32) -> Result<(), DeviceError> {
        self.done("set_speed", Request::SetSpeed(value))
    }

    fn output_channels(&self) -> usize {
        self.outputs
    }
}
