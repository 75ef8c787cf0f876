mod consumers;
mod helpers;
mod storage;
