fn main() {
    testdesign_lib::run()
}
