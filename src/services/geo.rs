//! Distancia de gran círculo (haversine)

use crate::models::location::Coordinates;

/// Radio medio de la Tierra en kilómetros
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distancia haversine entre dos coordenadas, en kilómetros
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // clamp: el redondeo puede dejar h ligeramente por encima de 1
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNE: Coordinates = Coordinates { latitude: 18.5204, longitude: 73.8567 };
    const MUMBAI: Coordinates = Coordinates { latitude: 19.0760, longitude: 72.8777 };

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(haversine_km(PUNE, PUNE), 0.0);
        assert_eq!(haversine_km(MUMBAI, MUMBAI), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (PUNE, MUMBAI),
            (Coordinates::new(0.0, 0.0), Coordinates::new(-33.8688, 151.2093)),
            (Coordinates::new(89.9, 10.0), Coordinates::new(-89.9, -170.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_km(a, b), haversine_km(b, a));
        }
    }

    #[test]
    fn test_pune_to_mumbai() {
        let km = haversine_km(PUNE, MUMBAI);
        assert!(km > 110.0 && km < 130.0, "unexpected distance {km}");
    }

    #[test]
    fn test_nearby_point_is_sub_km() {
        let nearby = Coordinates::new(18.5210, 73.8570);
        assert!(haversine_km(PUNE, nearby) < 1.0);
    }

    #[test]
    fn test_antipodal_points() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((km - half_circumference).abs() < 1e-6);
    }
}
