/*
 * Parking lot occupancy controller.
 *
 * Buttons at the entrance and exit of the lot raise interrupts, the input
 * layer debounces them and posts logical events on the signal bus, and one
 * worker per event kind updates the shared count and the screen. A separate
 * indicator worker shows how full the lot is on an RGB light.
 *
 * Everything in this library is hardware independent. The board binary
 * provides the renderer, the buzzer, the lights and the bootloader jump.
 */
#![cfg_attr(not(test), no_std)]

// Must come first, the other modules use its macros.
mod fmt;

pub mod bootloader;
pub mod bus;
pub mod config;
pub mod display;
pub mod error;
pub mod feedback;
pub mod indicator;
pub mod input;
pub mod occupancy;
pub mod workers;
