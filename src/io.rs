/*
 * The I/O module for the parking controller.
 *
 * This module holds everything that touches the actual pins on the device:
 * the button inputs, the RGB indicator, the buzzer and the handoff to the
 * system bootloader. The intention is for this module (and the screen driver)
 * to be the only part of the program that is device-specific.
 *
 * The event input tasks run on the interrupt executor. They only stamp each
 * falling edge and hand it to the input layer, which debounces it and posts on
 * the bus without ever blocking. The bootloader button is watched from the
 * thread executor instead.
 */

use cortex_m::peripheral::{NVIC, SCB};
use embassy_stm32::{
    exti::ExtiInput,
    gpio::{Level, Output},
    peripherals::TIM1,
    time::Hertz,
    timer::simple_pwm::SimplePwm,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;

use parking::{
    bootloader::{EscapeHatch, RomBootloader, RomHandoff},
    feedback::{Buzzer, ToneOutput},
    indicator::{IndicatorLights, Rgb},
    input::{InputLayer, InputSource},
};

pub type BoardHatch =
    EscapeHatch<'static, CriticalSectionRawMutex, Buzzer<PwmTone>, RomBootloader<CoreHandoff>>;

#[embassy_executor::task(pool_size = 3)]
pub async fn input_task(
    mut button: ExtiInput<'static>,
    source: InputSource,
    inputs: &'static InputLayer<'static>,
) -> ! {
    loop {
        button.wait_for_falling_edge().await;
        inputs.on_raw_edge(source, Instant::now());
    }
}

// Runs on the thread executor: the ROM must be entered from thread mode, not
// from inside an interrupt handler.
#[embassy_executor::task]
pub async fn bootloader_task(
    mut button: ExtiInput<'static>,
    inputs: &'static InputLayer<'static>,
    mut hatch: BoardHatch,
) -> ! {
    loop {
        button.wait_for_falling_edge().await;
        hatch.on_raw_edge(inputs, Instant::now()).await;
    }
}

/// Puts the Cortex-M3 core back in its reset state for the ROM bootloader.
/// The core peripherals are stolen, by the time this runs nothing else of the
/// program will use them again.
pub struct CoreHandoff;

impl RomHandoff for CoreHandoff {
    fn mask_interrupts(&mut self) {
        cortex_m::interrupt::disable();
    }

    fn disable_all_irqs(&mut self) {
        // SAFETY: interrupts are masked, writing ones to ICER only disables.
        let nvic = unsafe { &*NVIC::PTR };
        for icer in nvic.icer.iter() {
            unsafe { icer.write(u32::MAX) }
        }
    }

    fn clear_pending_irqs(&mut self) {
        // SAFETY: as above, ICPR only clears pending bits.
        let nvic = unsafe { &*NVIC::PTR };
        for icpr in nvic.icpr.iter() {
            unsafe { icpr.write(u32::MAX) }
        }
        SCB::clear_pendsv();
        SCB::clear_pendst();
    }

    fn stop_systick(&mut self) {
        // SAFETY: the time driver runs on a TIM peripheral, SysTick is ours.
        let mut syst = unsafe { cortex_m::Peripherals::steal() }.SYST;
        syst.disable_interrupt();
        syst.disable_counter();
    }

    fn relocate_vectors(&mut self, vector_table: u32) {
        // SAFETY: no interrupt can be taken until `unmask_interrupts`, and by
        // then every IRQ is disabled.
        unsafe { (*SCB::PTR).vtor.write(vector_table) }
    }

    fn unmask_interrupts(&mut self) {
        // SAFETY: nothing is enabled in the NVIC any more.
        unsafe { cortex_m::interrupt::enable() }
    }

    fn jump(&mut self, vector_table: u32) {
        // SAFETY: the core is in its reset state and nothing of this program
        // runs after the jump, the ROM bootloader sets the machine up itself.
        unsafe { cortex_m::asm::bootload(vector_table as *const u32) }
    }
}

// Deal with active-high or active-low, so that the indicator can just use
// easy to understand `true` for on logic. All three LEDs are active-high.
fn light(led: &mut Output, on: bool) {
    led.set_level(if on { Level::High } else { Level::Low });
}

pub struct RgbLights {
    red: Output<'static>,
    green: Output<'static>,
    blue: Output<'static>,
}

impl RgbLights {
    pub fn new(red: Output<'static>, green: Output<'static>, blue: Output<'static>) -> Self {
        Self { red, green, blue }
    }
}

impl IndicatorLights for RgbLights {
    fn set(&mut self, rgb: Rgb) {
        light(&mut self.red, rgb.red);
        light(&mut self.green, rgb.green);
        light(&mut self.blue, rgb.blue);
    }
}

/// The buzzer on TIM1 channel 1, driven with a 50% duty square wave.
pub struct PwmTone {
    pwm: SimplePwm<'static, TIM1>,
}

impl PwmTone {
    pub fn new(pwm: SimplePwm<'static, TIM1>) -> Self {
        Self { pwm }
    }
}

impl ToneOutput for PwmTone {
    fn start(&mut self, frequency_hz: u32) {
        self.pwm.set_frequency(Hertz(frequency_hz));
        let mut channel = self.pwm.ch1();
        channel.set_duty_cycle_percent(50);
        channel.enable();
    }

    fn stop(&mut self) {
        self.pwm.ch1().disable();
    }
}
