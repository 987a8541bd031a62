use std::f64::consts::PI;

use log::info;
use nalgebra::Vector3;

use orbit_transfer::orbital::OrbitElements;
use orbit_transfer::physics::CentralBody;
use orbit_transfer::transfer::{
    circular_velocity, dv_circ, hohmann_transfer, hyperbola_parameters, is_flyby_viable,
    solve_lambert_3d, HyperbolaKind, LegEnd, TransferType,
};

const AU: f64 = 1.495_978_707e11; // m
const DAY: f64 = 86_400.0;        // s

fn main() {
    let _ = pretty_env_logger::try_init();

    let earth = CentralBody::EARTH;
    let sun = CentralBody::SUN;

    println!();
    println!("====================================================================");
    println!("  ORBIT TRANSFER REPORT");
    println!("====================================================================");
    println!();

    // -----------------------------------------------------------------------
    // Parking orbit
    // -----------------------------------------------------------------------
    let parking = OrbitElements::from_elements(
        earth.radius + 400_000.0, // m
        0.001,
        51.6_f64.to_radians(),
        0.0,
        0.0,
        0.0,
        &earth,
    );
    let half_orbit = parking.propagate_by_time(parking.period() / 2.0);
    let osv = half_orbit.to_state_vector();

    println!("  Parking Orbit");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  SMA:           {:>10.1} km   Ecc:          {:>8.4}",
        parking.sma / 1000.0,
        parking.ecc
    );
    println!(
        "  Inclination:   {:>10.2} deg  Period:       {:>8.1} min",
        parking.inc.to_degrees(),
        parking.period() / 60.0
    );
    println!(
        "  Half orbit:    ta={:>6.2} deg   alt={:>8.1} km   vel={:>7.1} m/s",
        half_orbit.true_anom.to_degrees(),
        osv.altitude(&earth) / 1000.0,
        osv.speed()
    );
    println!();

    // -----------------------------------------------------------------------
    // Hohmann LEO -> GEO
    // -----------------------------------------------------------------------
    let r_leo = earth.radius + 300_000.0;
    let r_geo = 42_164_000.0;
    let hohmann = hohmann_transfer(r_leo, r_geo, &earth);

    println!("  Hohmann Transfer  LEO ({:.0} km) -> GEO", (r_leo - earth.radius) / 1000.0);
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Departure burn: {:>8.1} m/s   Arrival burn: {:>8.1} m/s",
        hohmann.dv_departure, hohmann.dv_arrival
    );
    println!(
        "  Total dv:       {:>8.1} m/s   Duration:     {:>8.2} h",
        hohmann.total_dv,
        hohmann.duration / 3600.0
    );
    println!();

    // -----------------------------------------------------------------------
    // Heliocentric Lambert transfer (Earth-like -> Mars-like orbit)
    // -----------------------------------------------------------------------
    let r0 = Vector3::new(AU, 0.0, 0.0);
    let arrival_angle = 150.0_f64.to_radians();
    let r1 = 1.524 * AU * Vector3::new(arrival_angle.cos(), arrival_angle.sin(), 0.03);
    let tof = 210.0 * DAY;
    let transfer = solve_lambert_3d(&r0, &r1, tof, &sun);

    println!("  Lambert Transfer  1.000 AU -> 1.524 AU, {:.0} days", tof / DAY);
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Status:         {:?} after {} iterations",
        transfer.status, transfer.iterations
    );

    match transfer.ok() {
        Ok(transfer) => {
            let v_earth = Vector3::new(0.0, circular_velocity(AU, &sun), 0.0);
            let departure = hyperbola_parameters(
                &v_earth,
                &transfer.vel0,
                &v_earth,
                &earth,
                200_000.0,
                HyperbolaKind::Departure,
            );
            let v_inf = departure.c3.sqrt();
            println!(
                "  Departure v:    {:>8.1} m/s   C3:           {:>8.2} km^2/s^2",
                transfer.vel0.norm(),
                departure.c3 / 1e6
            );
            if let Some(leg) = departure.outgoing {
                println!(
                    "  Asymptote:      decl={:>6.2} deg   RA={:>7.2} deg",
                    leg.declination.to_degrees(),
                    leg.bplane_angle.to_degrees()
                );
            }
            println!(
                "  Escape burn:    {:>8.1} m/s from a 200 km circular orbit",
                dv_circ(&earth, 200_000.0, v_inf)
            );

            let dep = LegEnd { body: &earth, periapsis_altitude: 200_000.0, v_inf };
            let arr = LegEnd { body: &earth, periapsis_altitude: 500_000.0, v_inf };
            println!(
                "  Circ/capture:   {:>8.1} m/s total (same-size body at both ends)",
                TransferType::CircularCapture.total_dv(&dep, &arr)
            );
        }
        Err(err) => println!("  Transfer rejected: {err}"),
    }
    println!();

    // -----------------------------------------------------------------------
    // Gravity assist
    // -----------------------------------------------------------------------
    let v_body = Vector3::new(0.0, 29_780.0, 0.0);
    let v_inf = 5_000.0;
    let turn = 60.0_f64.to_radians();
    let v_arr = v_body + Vector3::new(v_inf, 0.0, 0.0);
    let v_dep = v_body + v_inf * Vector3::new(turn.cos(), turn.sin(), 0.0);
    let flyby = hyperbola_parameters(&v_arr, &v_dep, &v_body, &earth, 0.0, HyperbolaKind::Flyby);

    println!(
        "  Gravity Assist  v_inf={:.1} km/s, turn {:.0} deg",
        v_inf / 1000.0,
        turn.to_degrees()
    );
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Periapsis alt:  {:>8.1} km    Viable:       {}",
        (flyby.periapsis - earth.radius) / 1000.0,
        is_flyby_viable(&v_arr, &v_dep, &v_body, &earth, 1.0)
    );
    if let Some(bvazi) = flyby.incoming.and_then(|leg| leg.bvector_azimuth) {
        println!("  B-vector az:    {:>8.2} deg", bvazi * 180.0 / PI);
    }
    println!();
    println!("====================================================================");
    println!();

    info!("report complete");
}
