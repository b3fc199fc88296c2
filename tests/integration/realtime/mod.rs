//! Socket gateway tests over a real listener

#[cfg(all(feature = "ssr", feature = "client"))]
mod client_test;
#[cfg(all(feature = "ssr", feature = "client"))]
mod gateway_test;
