use num_bigint::BigInt;
use pdd::PddManager;

fn main() {
    env_logger::init();

    let man = PddManager::new(3);
    let x1 = man.mk_var(1).unwrap();
    let x2 = man.mk_var(2).unwrap();
    let x3 = man.mk_var(3).unwrap();

    let a = x1.mul(&x2).unwrap().add(&x3).unwrap();
    let b = x1
        .mul(&x3)
        .unwrap()
        .add_scalar(pdd::Rational::from_integer(BigInt::from(1)))
        .unwrap();

    println!("a = {a}");
    println!("b = {b}");

    match a.try_spoly(&b).unwrap() {
        Some(s) => println!("spoly(a, b) = {s}"),
        None => println!("spoly(a, b) = None (no shared variable in leading monomials)"),
    }

    println!("{man:?}");
}
