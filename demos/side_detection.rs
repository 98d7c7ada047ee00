//! Side detection and position optimization on a short route.
//!
//! Run with: cargo run --example side_detection

use route_poi::{
    run_pipeline, NearbySearchResponse, OptimizationStrategy, OptimizerConfig, PipelineConfig,
    RawPoiObservation, RouteObservation, RoutePoint, OPTIMIZED_HEADER, PROCESSED_HEADER,
};

fn main() {
    // Northbound street in District 1, Ho Chi Minh City
    let points: Vec<RoutePoint> = (0..5)
        .map(|i| RoutePoint::new(10.7760 + i as f64 * 0.0003, 106.7000, i))
        .collect();

    // One point's results arrive as a raw places API body
    let body = r#"{"code": "ok", "result": [
        {"name": "Coffee House", "location": {"lat": 10.7766, "lng": 106.7004}, "types": ["cafe"]},
        {"name": "Vietcombank", "location": {"lat": 10.7768, "lng": 106.6995}, "types": ["bank"]}
    ]}"#;
    let response = match NearbySearchResponse::from_json(body) {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Bad payload: {}", e);
            return;
        }
    };

    let route = vec![
        RouteObservation::from_response(points[0], response),
        RouteObservation::new(
            points[1],
            vec![
                RawPoiObservation::new("Coffee Hous", 10.77662, 106.70041)
                    .with_types(["cafe", "point"]),
                RawPoiObservation::new("Vietcombank", 10.7768, 106.6995),
            ],
        ),
        RouteObservation::new(
            points[2],
            vec![RawPoiObservation::new("Circle K", 10.7772, 106.7003)],
        ),
        RouteObservation::new(
            points[3],
            vec![
                RawPoiObservation::new("Coffee House", 10.77658, 106.70038),
                RawPoiObservation::new("Circle K", 10.7772, 106.7003),
            ],
        ),
        RouteObservation::new(points[4], vec![]),
    ];

    println!("POI Side Detection\n");

    for strategy in [
        OptimizationStrategy::Mean,
        OptimizationStrategy::GeometricMedian,
        OptimizationStrategy::BearingProjection,
    ] {
        let config = PipelineConfig {
            optimizer: OptimizerConfig {
                strategy,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = match run_pipeline(&route, &config) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Pipeline failed: {}", e);
                return;
            }
        };

        if strategy == OptimizationStrategy::Mean {
            println!("{}", PROCESSED_HEADER.join(" | "));
            for record in &result.records {
                println!("{}", record.to_fields().join(" | "));
            }
            println!();
        }

        println!("Strategy: {:?}", strategy);
        for poi in &result.optimized {
            println!(
                "   {:<14} ({:.6}, {:.6}) from {} observations",
                poi.poi_name, poi.optimal_lat, poi.optimal_lon, poi.member_count
            );
        }
        println!("   {}", OPTIMIZED_HEADER.join(" | "));
        for row in &result.rows {
            println!("   {}", row.to_fields().join(" | "));
        }
        println!();
    }
}
