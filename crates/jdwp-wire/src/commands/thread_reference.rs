use jdwp_types::command_set::THREAD_REFERENCE;
use jdwp_types::thread_reference::*;
use jdwp_types::{FrameId, Int, Location, ThreadId};

command! {
    command_set: THREAD_REFERENCE;
    command: RESUME;
    /// Resumes a single thread
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Resume {
        pub thread: ThreadId,
    } -> {}
}

command! {
    command_set: THREAD_REFERENCE;
    command: FRAMES;
    /// The current call stack of a suspended thread. A `length` of -1 asks for every frame from
    /// `start_frame` on.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frames {
        pub thread: ThreadId,
        pub start_frame: Int,
        pub length: Int,
    } -> {
        pub frames: Vec<FrameInfo>,
    }
}

payload! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FrameInfo {
        pub frame_id: FrameId,
        pub location: Location,
    }
}
