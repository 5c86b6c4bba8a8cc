/*
[INPUT]:  Collection subscriptions opened through CocobaseClient
[OUTPUT]: Realtime change events
[POS]:    WebSocket layer - realtime change feeds
[UPDATE]: When changing subscription handling
*/

pub mod client;

pub use client::Connection;
