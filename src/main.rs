fn main() {
    racer_core::run()
}
