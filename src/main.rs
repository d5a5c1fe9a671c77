#![no_std]
#![no_main]

/*
 * Board bring-up for the parking controller on the DESPI-M02 (STM32F103VE).
 *
 * Wiring:
 *   PE11 entry button, PE13 exit button, PE14 reset button, PE15 bootloader
 *   button, all to ground with the internal pull-up.
 *   PB10 red, PB14 green, PB12 blue indicator LED.
 *   PA8 (TIM1 CH1) buzzer.
 *   PB6/PB7 I2C1 SCL/SDA to the SSD1306 panel at 0x3C.
 *
 * Workers run on the thread-mode executor. The event button tasks run on an
 * interrupt executor on the otherwise unused UART4 vector, so they preempt the
 * workers the way a plain interrupt handler would. The bootloader button task
 * stays in thread mode, the ROM bootloader cannot be entered from a handler.
 *
 * The buzzer is shared by the entry worker and the bootloader button.
 */

use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::{
    exti::ExtiInput,
    gpio::{Level, Output, OutputType, Pull, Speed},
    i2c::{self, I2c},
    interrupt,
    interrupt::{InterruptExt, Priority},
    time::Hertz,
    timer::{
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm},
    },
};
use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, ThreadModeRawMutex},
    mutex::Mutex,
};
use panic_halt as _;
use static_cell::StaticCell;

use parking::{
    bus::SignalBus,
    bootloader::{EscapeHatch, RomBootloader},
    config::{
        BOOTLOADER_BEEP, BUZZER_BASE_FREQUENCY_HZ, CAPACITY, DEBOUNCE_WINDOW, SYSTEM_MEMORY,
        Timings,
    },
    display::DisplaySerializer,
    feedback::Buzzer,
    indicator::IndicatorWorker,
    input::{InputLayer, InputSource},
    occupancy::Occupancy,
    workers::{EntryWorker, ExitWorker, ResetWorker, Shared},
};

mod io;
mod oled;

use io::{CoreHandoff, PwmTone, RgbLights};
use oled::Oled;

type Display = DisplaySerializer<ThreadModeRawMutex, Oled>;
type BoardShared = Shared<'static, ThreadModeRawMutex, Oled>;
type SharedBuzzer = Mutex<CriticalSectionRawMutex, Buzzer<PwmTone>>;

static BUS: SignalBus = SignalBus::new();
static OCCUPANCY: Occupancy = Occupancy::new(CAPACITY);
static INPUTS: InputLayer<'static> = InputLayer::new(&BUS, DEBOUNCE_WINDOW);
static DISPLAY: StaticCell<Display> = StaticCell::new();
static BUZZER: StaticCell<SharedBuzzer> = StaticCell::new();

static EXECUTOR_INPUT: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    unsafe { EXECUTOR_INPUT.on_interrupt() }
}

#[embassy_executor::task]
async fn entry_task(shared: BoardShared, buzzer: &'static SharedBuzzer) -> ! {
    EntryWorker::new(shared, buzzer).run(&BUS.entry).await
}

#[embassy_executor::task]
async fn exit_task(shared: BoardShared) -> ! {
    ExitWorker::new(shared).run(&BUS.exit).await
}

#[embassy_executor::task]
async fn reset_task(shared: BoardShared) -> ! {
    ResetWorker::new(shared).run(&BUS.reset).await
}

#[embassy_executor::task]
async fn indicator_task(worker: IndicatorWorker<'static, RgbLights>) -> ! {
    worker.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_stm32::init(Default::default());
    defmt::info!("parking controller up, {} slots", CAPACITY);

    let i2c = I2c::new_blocking(
        peripherals.I2C1,
        peripherals.PB6,
        peripherals.PB7,
        Hertz(400_000),
        i2c::Config::default(),
    );
    let display: &'static Display = DISPLAY.init(DisplaySerializer::new(Oled::new(i2c)));

    let timings = Timings::default();
    let shared = Shared::new(&OCCUPANCY, display, timings);
    shared.splash().await;

    let pwm = SimplePwm::new(
        peripherals.TIM1,
        Some(PwmPin::new_ch1(peripherals.PA8, OutputType::PushPull)),
        None,
        None,
        None,
        Hertz(BUZZER_BASE_FREQUENCY_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let buzzer: &'static SharedBuzzer = BUZZER.init(Mutex::new(Buzzer::new(PwmTone::new(pwm))));

    let lights = RgbLights::new(
        Output::new(peripherals.PB10, Level::Low, Speed::Low),
        Output::new(peripherals.PB14, Level::Low, Speed::Low),
        Output::new(peripherals.PB12, Level::Low, Speed::Low),
    );

    spawner.spawn(entry_task(shared, buzzer)).unwrap();
    spawner.spawn(exit_task(shared)).unwrap();
    spawner.spawn(reset_task(shared)).unwrap();
    spawner
        .spawn(indicator_task(IndicatorWorker::new(
            &OCCUPANCY,
            lights,
            timings.indicator_period,
        )))
        .unwrap();

    interrupt::UART4.set_priority(Priority::P6);
    let input_spawner = EXECUTOR_INPUT.start(interrupt::UART4);

    let entry_button = ExtiInput::new(peripherals.PE11, peripherals.EXTI11, Pull::Up);
    let exit_button = ExtiInput::new(peripherals.PE13, peripherals.EXTI13, Pull::Up);
    let reset_button = ExtiInput::new(peripherals.PE14, peripherals.EXTI14, Pull::Up);
    let bootloader_button = ExtiInput::new(peripherals.PE15, peripherals.EXTI15, Pull::Up);

    input_spawner
        .spawn(io::input_task(entry_button, InputSource::EntryButton, &INPUTS))
        .unwrap();
    input_spawner
        .spawn(io::input_task(exit_button, InputSource::ExitButton, &INPUTS))
        .unwrap();
    input_spawner
        .spawn(io::input_task(reset_button, InputSource::ResetButton, &INPUTS))
        .unwrap();
    let hatch = EscapeHatch::new(
        buzzer,
        BOOTLOADER_BEEP,
        RomBootloader::new(CoreHandoff, SYSTEM_MEMORY),
    );
    spawner
        .spawn(io::bootloader_task(bootloader_button, &INPUTS, hatch))
        .unwrap();

    defmt::info!("waiting for cars");
}
