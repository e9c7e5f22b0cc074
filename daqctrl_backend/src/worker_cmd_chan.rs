use std::sync::Arc;
use parking_lot::{Condvar, Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerCmd {
    Start,
    Stop,
    Close,
}

pub struct CmdChan {
    cmd: Arc<Mutex<(usize, WorkerCmd)>>,  // (msg_num: usize, worker_cmd: WorkerCmd)
    condvar: Arc<Condvar>,
}
impl Default for CmdChan {
    fn default() -> Self {
        Self::new()
    }
}
impl CmdChan {
    pub fn new() -> Self {
        Self {
            cmd: Arc::new(Mutex::new((0, WorkerCmd::Close))),
            condvar: Arc::new(Condvar::new()),
        }
    }
    pub fn new_recvr(&self) -> CmdRecvr {
        // A receiver created after some messages were posted only reacts to later ones
        let (msg_num, _cmd_val) = &*self.cmd.lock();
        CmdRecvr {
            cmd: self.cmd.clone(),
            condvar: self.condvar.clone(),
            viewed_msg_num: *msg_num,
        }
    }
    pub fn send(&self, cmd: WorkerCmd) {
        let mut mutex_guard = self.cmd.lock();
        let (msg_num, cmd_val) = &mut *mutex_guard;
        *cmd_val = cmd;
        *msg_num += 1;
        self.condvar.notify_all();
    }
}

/// Receiving end. Only the latest posted command is kept: a receiver that
/// falls behind skips straight to it.
pub struct CmdRecvr {
    cmd: Arc<Mutex<(usize, WorkerCmd)>>,
    condvar: Arc<Condvar>,
    viewed_msg_num: usize,
}
impl CmdRecvr {
    /// Blocks until a command newer than the last one viewed is posted.
    pub fn recv(&mut self) -> WorkerCmd {
        let mut mutex_guard = self.cmd.lock();
        while mutex_guard.0 == self.viewed_msg_num {
            self.condvar.wait(&mut mutex_guard);
        }
        let (msg_num, cmd_val) = *mutex_guard;
        self.viewed_msg_num = msg_num;
        cmd_val
    }

    /// Non-blocking: the newest command if one was posted since the last view.
    pub fn poll(&mut self) -> Option<WorkerCmd> {
        let (msg_num, cmd_val) = *self.cmd.lock();
        if msg_num == self.viewed_msg_num {
            None
        } else {
            self.viewed_msg_num = msg_num;
            Some(cmd_val)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_sees_only_new_commands() {
        let chan = CmdChan::new();
        chan.send(WorkerCmd::Start);
        let mut recvr = chan.new_recvr();
        assert_eq!(recvr.poll(), None);
        chan.send(WorkerCmd::Stop);
        assert_eq!(recvr.poll(), Some(WorkerCmd::Stop));
        assert_eq!(recvr.poll(), None);
    }

    #[test]
    fn recv_skips_to_latest() {
        let chan = CmdChan::new();
        let mut recvr = chan.new_recvr();
        chan.send(WorkerCmd::Start);
        chan.send(WorkerCmd::Close);
        assert_eq!(recvr.recv(), WorkerCmd::Close);
    }
}
